//! Hash operations on [`CacheStore`].

use std::collections::HashMap;

use crate::cache::{CacheStore, Entry, EntryKind, HashEntry};
use crate::error::Result;

impl CacheStore {
    /// Returns the value of `field` in the hash at `key`.
    pub fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.with_existing(key, EntryKind::Hash, Entry::as_hash, None, |hash| {
            hash.get(field)
        })
    }

    /// Returns the listed fields that exist, keyed by field name.
    pub fn hget_many<S: AsRef<str>>(&self, key: &str, fields: &[S]) -> Result<HashMap<String, String>> {
        self.with_existing(key, EntryKind::Hash, Entry::as_hash, HashMap::new(), |hash| {
            hash.get_many(fields)
        })
    }

    /// Returns every field of the hash, or an empty map if the key is missing.
    pub fn hget_all(&self, key: &str) -> Result<HashMap<String, String>> {
        self.with_existing(key, EntryKind::Hash, Entry::as_hash, HashMap::new(), HashEntry::all)
    }

    /// Sets `field` to `value`, creating the hash if needed.
    pub fn hset(&self, key: &str, field: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.with_or_create(key, EntryKind::Hash, Entry::as_hash, new_hash, |hash| {
            hash.set(field, value)
        })
    }

    /// Sets every field in `pairs`, creating the hash if needed.
    pub fn hset_many<I, K, V>(&self, key: &str, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_or_create(key, EntryKind::Hash, Entry::as_hash, new_hash, |hash| {
            hash.set_many(pairs)
        })
    }

    /// Removes `field`. Returns true if it was present.
    pub fn hremove(&self, key: &str, field: &str) -> Result<bool> {
        self.with_existing(key, EntryKind::Hash, Entry::as_hash, false, |hash| {
            hash.remove(field)
        })
    }

    /// Removes every listed field and returns how many were present.
    pub fn hremove_many<S: AsRef<str>>(&self, key: &str, fields: &[S]) -> Result<usize> {
        self.with_existing(key, EntryKind::Hash, Entry::as_hash, 0, |hash| {
            hash.remove_many(fields)
        })
    }
}

fn new_hash() -> Entry {
    Entry::Hash(HashEntry::new())
}
