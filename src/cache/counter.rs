//! Counter Module
//!
//! Atomic integer counters layered on the store, with tri-state results.

use std::time::Duration;

use crate::cache::{CacheStore, CounterEntry, Entry, Expirable};

// == Counter Result ==
/// Outcome of a counter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterResult {
    /// The key holds a value that is not a counter
    Failed,
    /// Legal no-op, e.g. the key does not exist
    NotEffective,
    /// Applied; carries the counter's value afterwards
    Success(i64),
}

impl CounterResult {
    /// Returns the carried value, or 0 unless the operation succeeded.
    pub fn value(&self) -> i64 {
        match self {
            CounterResult::Success(value) => *value,
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CounterResult::Success(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CounterResult::Failed => "failed",
            CounterResult::NotEffective => "not_effective",
            CounterResult::Success(_) => "success",
        }
    }
}

// == Counter Operations ==
/// Counter capability of the cache.
///
/// # Example
/// ```
/// use cache_engine::{CacheStore, CounterOps, CounterResult};
///
/// let store = CacheStore::new();
/// assert_eq!(store.increase("hits", 5), CounterResult::Success(5));
/// assert_eq!(store.increase("hits", 5), CounterResult::Success(10));
/// ```
pub trait CounterOps {
    /// Adds `delta`, creating a counter without TTL if the key is absent.
    fn increase(&self, key: &str, delta: i64) -> CounterResult;

    /// Like [`increase`](Self::increase), but a newly created counter expires
    /// after `ttl`. An existing counter keeps its TTL.
    fn increase_with_expire_when_not_exist(&self, key: &str, delta: i64, ttl: Duration) -> CounterResult;

    fn decrease(&self, key: &str, delta: i64) -> CounterResult {
        self.increase(key, delta.wrapping_neg())
    }

    /// Reads the counter without changing it.
    fn get_counter(&self, key: &str) -> CounterResult;

    /// Restarts the counter's TTL unconditionally.
    fn set_expire(&self, key: &str, ttl: Duration) -> CounterResult;

    /// Sets a TTL only on a counter that has none; `NotEffective` otherwise.
    fn set_expire_when_not_set(&self, key: &str, ttl: Duration) -> CounterResult;

    /// Removes the key now, whatever kind of value it holds.
    fn expire_immediately(&self, key: &str) -> CounterResult;
}

impl CacheStore {
    fn add_to_counter(&self, key: &str, delta: i64, ttl_if_new: Option<Duration>) -> CounterResult {
        let (entry, created) =
            self.entry_or_insert_with(key, || Entry::Counter(CounterEntry::new(delta, ttl_if_new)));
        match entry.as_counter() {
            Some(_) if created => CounterResult::Success(delta),
            Some(counter) => CounterResult::Success(counter.add(delta)),
            None => CounterResult::Failed,
        }
    }

    fn with_counter(&self, key: &str, f: impl FnOnce(&CounterEntry) -> CounterResult) -> CounterResult {
        match self.lookup(key) {
            Some(entry) => entry.as_counter().map_or(CounterResult::Failed, f),
            None => CounterResult::NotEffective,
        }
    }
}

impl CounterOps for CacheStore {
    fn increase(&self, key: &str, delta: i64) -> CounterResult {
        self.add_to_counter(key, delta, None)
    }

    fn increase_with_expire_when_not_exist(&self, key: &str, delta: i64, ttl: Duration) -> CounterResult {
        self.add_to_counter(key, delta, Some(ttl))
    }

    fn get_counter(&self, key: &str) -> CounterResult {
        self.with_counter(key, |counter| CounterResult::Success(counter.value()))
    }

    fn set_expire(&self, key: &str, ttl: Duration) -> CounterResult {
        self.with_counter(key, |counter| {
            counter.set_expiry(Some(ttl));
            CounterResult::Success(counter.value())
        })
    }

    fn set_expire_when_not_set(&self, key: &str, ttl: Duration) -> CounterResult {
        self.with_counter(key, |counter| {
            if counter.set_expiry_if_unset(ttl) {
                CounterResult::Success(counter.value())
            } else {
                CounterResult::NotEffective
            }
        })
    }

    fn expire_immediately(&self, key: &str) -> CounterResult {
        let Some(entry) = self.lookup(key) else {
            return CounterResult::NotEffective;
        };
        // Kind-agnostic: any live key is removed and reported as Success
        entry.expire_now();
        self.evict_if_current(key, &entry);
        CounterResult::Success(entry.as_counter().map_or(0, CounterEntry::value))
    }
}
