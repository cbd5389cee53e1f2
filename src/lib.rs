//! Cache Engine - An in-process typed key-value cache
//!
//! Stores strings, sets, hashes and counters with TTL expiration. Expired
//! entries are removed lazily on access and by a budgeted background
//! reclaimer.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, CounterOps, CounterResult, EntryKind, Expiry};
pub use config::{Config, EngineConfig};
pub use error::{CacheError, Result};
pub use lifecycle::Lifecycle;
