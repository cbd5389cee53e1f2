//! Cache Entry Module
//!
//! Defines the typed values held by the store and the expiration metadata
//! every one of them carries.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

// == Trackable ==
/// Expiration metadata embedded in every entry.
///
/// An entry without a creation time or without a TTL never expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trackable {
    /// When the TTL clock was (re)started, None = unset
    pub created_at: Option<DateTime<Utc>>,
    /// Time to live from `created_at`, None = no expiration
    pub ttl: Option<Duration>,
}

impl Trackable {
    /// Starts the clock now with the given TTL.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            created_at: Some(Utc::now()),
            ttl,
        }
    }

    /// Absolute expiry time, or None if the entry never expires.
    ///
    /// A TTL too large to represent as a timestamp is treated as "never".
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let created_at = self.created_at?;
        let ttl = TimeDelta::from_std(self.ttl?).ok()?;
        created_at.checked_add_signed(ttl)
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiry time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at() {
            Some(expires) => Utc::now() >= expires,
            None => false,
        }
    }

    /// Remaining lifetime, `Some(ZERO)` once expired, None if it never expires.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at()
            .map(|expires| (expires - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }
}

// == Expiry ==
/// Absolute expiry of a live key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "at", rename_all = "snake_case")]
pub enum Expiry {
    /// The key has no TTL
    Never,
    /// The key expires at this instant
    At(DateTime<Utc>),
}

// == Entry Kind ==
/// Discriminant of the stored value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Counter,
    String,
    Set,
    Hash,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Counter => "counter",
            EntryKind::String => "string",
            EntryKind::Set => "set",
            EntryKind::Hash => "hash",
        };
        f.write_str(name)
    }
}

// == Expirable ==
/// Expiration behaviour shared by every entry variant.
pub trait Expirable {
    /// Lock guarding this entry's expiration metadata.
    fn trackable(&self) -> &Mutex<Trackable>;

    fn is_expired(&self) -> bool {
        self.trackable().lock().is_expired()
    }

    /// Restarts the TTL clock with a new TTL (None = never expires).
    fn set_expiry(&self, ttl: Option<Duration>) {
        *self.trackable().lock() = Trackable::new(ttl);
    }

    /// Forces the entry into the expired state.
    fn expire_now(&self) {
        let mut trackable = self.trackable().lock();
        trackable.created_at = Some(Utc::now());
        trackable.ttl = Some(Duration::ZERO);
    }

    fn ttl(&self) -> Option<Duration> {
        self.trackable().lock().ttl
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.trackable().lock().remaining()
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.trackable().lock().expires_at()
    }
}

// == Counter Entry ==
/// Signed 64-bit counter with its own exclusive lock.
#[derive(Debug)]
pub struct CounterEntry {
    meta: Mutex<Trackable>,
    value: Mutex<i64>,
}

impl CounterEntry {
    pub fn new(value: i64, ttl: Option<Duration>) -> Self {
        Self {
            meta: Mutex::new(Trackable::new(ttl)),
            value: Mutex::new(value),
        }
    }

    pub fn value(&self) -> i64 {
        *self.value.lock()
    }

    /// Adds `delta`, wrapping on overflow, and returns the new value.
    pub fn add(&self, delta: i64) -> i64 {
        let mut value = self.value.lock();
        *value = value.wrapping_add(delta);
        *value
    }

    pub fn subtract(&self, delta: i64) -> i64 {
        self.add(delta.wrapping_neg())
    }

    pub fn set(&self, value: i64) {
        *self.value.lock() = value;
    }

    /// Sets the TTL only if none is set yet. Returns whether it was applied.
    pub fn set_expiry_if_unset(&self, ttl: Duration) -> bool {
        let mut meta = self.meta.lock();
        if meta.ttl.is_some() {
            return false;
        }
        *meta = Trackable::new(Some(ttl));
        true
    }
}

impl Expirable for CounterEntry {
    fn trackable(&self) -> &Mutex<Trackable> {
        &self.meta
    }
}

// == String Entry ==
/// Immutable string payload; overwrites replace the whole entry.
#[derive(Debug)]
pub struct StringEntry {
    meta: Mutex<Trackable>,
    value: String,
}

impl StringEntry {
    pub fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            meta: Mutex::new(Trackable::new(ttl)),
            value,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Expirable for StringEntry {
    fn trackable(&self) -> &Mutex<Trackable> {
        &self.meta
    }
}

// == Set Entry ==
/// Set of unique string members behind a reader/writer lock.
#[derive(Debug)]
pub struct SetEntry {
    meta: Mutex<Trackable>,
    members: RwLock<HashSet<String>>,
}

impl SetEntry {
    pub fn new() -> Self {
        Self {
            meta: Mutex::new(Trackable::new(None)),
            members: RwLock::new(HashSet::new()),
        }
    }

    pub fn add(&self, member: impl Into<String>) -> bool {
        self.members.write().insert(member.into())
    }

    /// Adds every member and returns how many were not present before.
    pub fn add_many<I, S>(&self, members: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = self.members.write();
        let mut added = 0;
        for member in members {
            if set.insert(member.into()) {
                added += 1;
            }
        }
        added
    }

    pub fn remove(&self, member: &str) -> bool {
        self.members.write().remove(member)
    }

    pub fn remove_many<S: AsRef<str>>(&self, members: &[S]) -> usize {
        let mut set = self.members.write();
        members
            .iter()
            .filter(|member| set.remove(member.as_ref()))
            .count()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.read().contains(member)
    }

    pub fn contains_all<S: AsRef<str>>(&self, members: &[S]) -> bool {
        let set = self.members.read();
        members.iter().all(|member| set.contains(member.as_ref()))
    }

    pub fn members(&self) -> Vec<String> {
        self.members.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl Default for SetEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl Expirable for SetEntry {
    fn trackable(&self) -> &Mutex<Trackable> {
        &self.meta
    }
}

// == Hash Entry ==
/// Field to value mapping behind a reader/writer lock.
#[derive(Debug)]
pub struct HashEntry {
    meta: Mutex<Trackable>,
    fields: RwLock<HashMap<String, String>>,
}

impl HashEntry {
    pub fn new() -> Self {
        Self {
            meta: Mutex::new(Trackable::new(None)),
            fields: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, field: &str) -> Option<String> {
        self.fields.read().get(field).cloned()
    }

    /// Returns the subset of `fields` that are present.
    pub fn get_many<S: AsRef<str>>(&self, fields: &[S]) -> HashMap<String, String> {
        let map = self.fields.read();
        fields
            .iter()
            .filter_map(|field| {
                map.get_key_value(field.as_ref())
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect()
    }

    pub fn set(&self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.write().insert(field.into(), value.into());
    }

    pub fn set_many<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = self.fields.write();
        for (field, value) in pairs {
            map.insert(field.into(), value.into());
        }
    }

    pub fn remove(&self, field: &str) -> bool {
        self.fields.write().remove(field).is_some()
    }

    pub fn remove_many<S: AsRef<str>>(&self, fields: &[S]) -> usize {
        let mut map = self.fields.write();
        fields
            .iter()
            .filter(|field| map.remove(field.as_ref()).is_some())
            .count()
    }

    pub fn all(&self) -> HashMap<String, String> {
        self.fields.read().clone()
    }

    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }
}

impl Default for HashEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl Expirable for HashEntry {
    fn trackable(&self) -> &Mutex<Trackable> {
        &self.meta
    }
}

// == Entry ==
/// A stored value of one of the supported kinds.
#[derive(Debug)]
pub enum Entry {
    Counter(CounterEntry),
    String(StringEntry),
    Set(SetEntry),
    Hash(HashEntry),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Counter(_) => EntryKind::Counter,
            Entry::String(_) => EntryKind::String,
            Entry::Set(_) => EntryKind::Set,
            Entry::Hash(_) => EntryKind::Hash,
        }
    }

    pub fn as_counter(&self) -> Option<&CounterEntry> {
        match self {
            Entry::Counter(counter) => Some(counter),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&StringEntry> {
        match self {
            Entry::String(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetEntry> {
        match self {
            Entry::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashEntry> {
        match self {
            Entry::Hash(hash) => Some(hash),
            _ => None,
        }
    }
}

impl Expirable for Entry {
    fn trackable(&self) -> &Mutex<Trackable> {
        match self {
            Entry::Counter(entry) => entry.trackable(),
            Entry::String(entry) => entry.trackable(),
            Entry::Set(entry) => entry.trackable(),
            Entry::Hash(entry) => entry.trackable(),
        }
    }
}
