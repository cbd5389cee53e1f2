//! Set operations on [`CacheStore`].

use crate::cache::sampling::{sample_members, sample_one};
use crate::cache::{CacheStore, Entry, EntryKind, SetEntry};
use crate::error::Result;

impl CacheStore {
    /// Returns true if `member` belongs to the set at `key`.
    pub fn is_member(&self, key: &str, member: &str) -> Result<bool> {
        self.with_existing(key, EntryKind::Set, Entry::as_set, false, |set| {
            set.contains(member)
        })
    }

    /// Returns true only if every one of `members` belongs to the set at `key`.
    ///
    /// A missing key yields false; an empty member list on an existing set yields true.
    pub fn is_members<S: AsRef<str>>(&self, key: &str, members: &[S]) -> Result<bool> {
        self.with_existing(key, EntryKind::Set, Entry::as_set, false, |set| {
            set.contains_all(members)
        })
    }

    /// Adds `member`, creating the set if needed. Returns true if it was new.
    pub fn add_member(&self, key: &str, member: impl Into<String>) -> Result<bool> {
        self.with_or_create(key, EntryKind::Set, Entry::as_set, new_set, |set| {
            set.add(member)
        })
    }

    /// Adds every member, creating the set if needed. Returns how many were new.
    pub fn add_members<I, S>(&self, key: &str, members: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_or_create(key, EntryKind::Set, Entry::as_set, new_set, |set| {
            set.add_many(members)
        })
    }

    /// Removes `member`. Returns true if it was present.
    pub fn remove_member(&self, key: &str, member: &str) -> Result<bool> {
        self.with_existing(key, EntryKind::Set, Entry::as_set, false, |set| {
            set.remove(member)
        })
    }

    /// Removes every listed member and returns how many were present.
    pub fn remove_members<S: AsRef<str>>(&self, key: &str, members: &[S]) -> Result<usize> {
        self.with_existing(key, EntryKind::Set, Entry::as_set, 0, |set| {
            set.remove_many(members)
        })
    }

    /// Returns every member of the set, or an empty list if the key is missing.
    pub fn get_members(&self, key: &str) -> Result<Vec<String>> {
        self.with_existing(key, EntryKind::Set, Entry::as_set, Vec::new(), SetEntry::members)
    }

    /// Returns one member chosen uniformly at random.
    pub fn get_random_member(&self, key: &str) -> Result<Option<String>> {
        let members = self.sampling_population(key)?;
        Ok(sample_one(&members, &mut *self.sampling_rng()))
    }

    /// Returns up to `count` distinct members chosen uniformly at random.
    ///
    /// When `count` covers the whole set every member is returned.
    pub fn get_random_members(&self, key: &str, count: usize) -> Result<Vec<String>> {
        let members = self.sampling_population(key)?;
        Ok(sample_members(members, count, &mut *self.sampling_rng()))
    }

    // Set iteration order differs between instances, so a seeded store
    // sorts the population to keep sampling reproducible.
    fn sampling_population(&self, key: &str) -> Result<Vec<String>> {
        let mut members = self.get_members(key)?;
        if self.sampling_is_seeded() {
            members.sort_unstable();
        }
        Ok(members)
    }
}

fn new_set() -> Entry {
    Entry::Set(SetEntry::new())
}
