//! Cache Module
//!
//! Provides the typed in-memory store with TTL expiration, counters and
//! random set sampling.

mod counter;
mod entry;
mod hashes;
mod json;
pub mod sampling;
mod sets;
mod stats;
mod store;


// Re-export public types
pub use counter::{CounterOps, CounterResult};
pub use entry::{
    CounterEntry, Entry, EntryKind, Expirable, Expiry, HashEntry, SetEntry, StringEntry, Trackable,
};
pub use stats::CacheStats;
pub use store::{CacheStore, DEADLINE_CHECK_INTERVAL, SEGMENT_COUNT};
