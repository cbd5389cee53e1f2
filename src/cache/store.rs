//! Cache Store Module
//!
//! Main cache engine: the shared key table, lazy expiration, string values
//! and TTL management. Set, hash, JSON and counter operations extend
//! [`CacheStore`] from their own modules.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, Entry, EntryKind, Expirable, Expiry, StringEntry};
use crate::config::EngineConfig;
use crate::error::{CacheError, Result};
use crate::lifecycle::Lifecycle;
use crate::tasks::{Reclaimer, ReclaimerHandle, ReclaimerSettings, ReclaimerState, Sweep};

/// Number of keys scanned between two deadline checks during a sweep.
pub const DEADLINE_CHECK_INTERVAL: usize = 100;

/// Number of independently locked segments in the key table.
pub const SEGMENT_COUNT: usize = 64;

type Segment = RwLock<HashMap<String, Arc<Entry>>>;

pub(crate) struct StoreInner {
    /// Key table split by key hash; each lock guards its segment's key set only
    segments: Box<[Segment]>,
    hasher: RandomState,
    /// Segment the next sweep starts from
    sweep_cursor: AtomicUsize,
    /// Source of randomness for member sampling
    rng: Mutex<StdRng>,
    /// Set when the RNG was seeded, so sampling must not depend on set order
    seeded: bool,
    stats: StatsRecorder,
    reclaimer: Option<ReclaimerHandle>,
}

// == Cache Store ==
/// Concurrent typed key-value store with TTL expiration.
///
/// Cloning is cheap and yields a handle to the same table. Operations on
/// different keys never contend beyond short map lookups.
///
/// # Example
/// ```
/// use cache_engine::CacheStore;
/// use std::time::Duration;
///
/// let store = CacheStore::new();
/// store.store_with_ttl("session", "abc", Duration::from_secs(60));
/// assert_eq!(store.load("session").unwrap().as_deref(), Some("abc"));
/// ```
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

impl CacheStore {
    // == Constructors ==
    /// Creates a store that relies on lazy expiration only.
    pub fn new() -> Self {
        Self::from_inner(StdRng::from_entropy(), false)
    }

    /// Creates a lazy-only store with a fixed sampling seed.
    pub fn with_random_seed(seed: u64) -> Self {
        Self::from_inner(StdRng::seed_from_u64(seed), true)
    }

    /// Creates a store from engine configuration.
    ///
    /// When active cleaning is enabled the background reclaimer is spawned
    /// on the current Tokio runtime and a shutdown hook stopping it is
    /// registered with `lifecycle`.
    ///
    /// # Errors
    /// - `InvalidConfig` if the reclaimer knobs are out of range
    /// - `RuntimeUnavailable` if active cleaning is enabled outside a Tokio runtime
    pub fn with_config(config: &EngineConfig, lifecycle: &Lifecycle) -> Result<Self> {
        config.validate()?;

        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let seeded = config.random_seed.is_some();
        if !config.enable_active_cleaning {
            return Ok(Self::from_inner(rng, seeded));
        }

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CacheError::RuntimeUnavailable);
        }

        let settings = ReclaimerSettings::from(config);
        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner>| {
            StoreInner::new(rng, seeded, Some(Reclaimer::spawn(weak.clone(), settings)))
        });

        if let Some(reclaimer) = &inner.reclaimer {
            let exit = reclaimer.exit_signal();
            lifecycle.register_shutdown_hook("cache reclaimer", move || exit.send());
        }

        Ok(Self { inner })
    }

    fn from_inner(rng: StdRng, seeded: bool) -> Self {
        Self {
            inner: Arc::new(StoreInner::new(rng, seeded, None)),
        }
    }

    // == Lookup Helpers ==
    /// Returns the live entry for `key`, deleting it first if it has expired.
    pub(crate) fn lookup(&self, key: &str) -> Option<Arc<Entry>> {
        let entry = self.inner.segment(key).read().get(key).cloned()?;
        if entry.is_expired() {
            if self.evict_if_current(key, &entry) {
                self.inner.stats.record_lazy_expiration();
            }
            return None;
        }
        Some(entry)
    }

    /// Removes `key` only if it still maps to `entry`.
    pub(crate) fn evict_if_current(&self, key: &str, entry: &Arc<Entry>) -> bool {
        let mut entries = self.inner.segment(key).write();
        remove_if_current(&mut entries, key, entry)
    }

    /// Returns the live entry for `key`, inserting `create()` if there is none.
    ///
    /// The flag is true when this call inserted the entry.
    pub(crate) fn entry_or_insert_with(
        &self,
        key: &str,
        create: impl FnOnce() -> Entry,
    ) -> (Arc<Entry>, bool) {
        if let Some(entry) = self.lookup(key) {
            return (entry, false);
        }

        let mut entries = self.inner.segment(key).write();
        if let Some(existing) = entries.get(key) {
            if !existing.is_expired() {
                return (Arc::clone(existing), false);
            }
            self.inner.stats.record_lazy_expiration();
        }
        let entry = Arc::new(create());
        entries.insert(key.to_string(), Arc::clone(&entry));
        (entry, true)
    }

    /// Runs `f` on the entry for `key` viewed as the wanted kind.
    ///
    /// Returns `absent` without calling `f` if the key does not exist.
    pub(crate) fn with_existing<T, R>(
        &self,
        key: &str,
        wanted: EntryKind,
        view: for<'e> fn(&'e Entry) -> Option<&'e T>,
        absent: R,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R> {
        match self.lookup(key) {
            Some(entry) => Ok(f(expect_kind(key, &entry, wanted, view)?)),
            None => Ok(absent),
        }
    }

    /// Runs `f` on the entry for `key`, creating it with `create` if absent.
    pub(crate) fn with_or_create<T, R>(
        &self,
        key: &str,
        wanted: EntryKind,
        view: for<'e> fn(&'e Entry) -> Option<&'e T>,
        create: impl FnOnce() -> Entry,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R> {
        let (entry, _) = self.entry_or_insert_with(key, create);
        Ok(f(expect_kind(key, &entry, wanted, view)?))
    }

    pub(crate) fn sampling_rng(&self) -> parking_lot::MutexGuard<'_, StdRng> {
        self.inner.rng.lock()
    }

    pub(crate) fn sampling_is_seeded(&self) -> bool {
        self.inner.seeded
    }

    // == Key Queries ==
    /// Returns true if `key` holds a live entry of any kind.
    pub fn exist_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns the absolute expiry of `key`, or None if it does not exist.
    pub fn get_expired_time(&self, key: &str) -> Option<Expiry> {
        self.lookup(key)
            .map(|entry| entry.expires_at().map_or(Expiry::Never, Expiry::At))
    }

    /// Returns the kind of value held at `key`.
    pub fn kind_of(&self, key: &str) -> Option<EntryKind> {
        self.lookup(key).map(|entry| entry.kind())
    }

    // == Load ==
    /// Returns the string stored at `key`.
    ///
    /// # Errors
    /// `ValueTypeMismatch` if the key holds a non-string value.
    pub fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_with_ttl(key)?.map(|(value, _)| value))
    }

    /// Returns the string stored at `key` with its remaining TTL
    /// (None = never expires).
    pub fn load_with_ttl(&self, key: &str) -> Result<Option<(String, Option<Duration>)>> {
        let Some(entry) = self.lookup(key) else {
            return Ok(None);
        };
        let string = expect_kind(key, &entry, EntryKind::String, Entry::as_string)?;
        Ok(Some((string.value().to_string(), entry.remaining_ttl())))
    }

    // == Store ==
    /// Replaces whatever `key` holds with a string that never expires.
    pub fn store(&self, key: &str, value: impl Into<String>) {
        self.put_string(key, value.into(), None);
    }

    /// Replaces whatever `key` holds with a string that expires after `ttl`.
    pub fn store_with_ttl(&self, key: &str, value: impl Into<String>, ttl: Duration) {
        self.put_string(key, value.into(), Some(ttl));
    }

    fn put_string(&self, key: &str, value: String, ttl: Option<Duration>) {
        let entry = Arc::new(Entry::String(StringEntry::new(value, ttl)));
        self.inner.segment(key).write().insert(key.to_string(), entry);
    }

    // == Delete ==
    /// Removes `key`. Returns true if a live entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.inner.segment(key).write().remove(key);
        match removed {
            Some(entry) if entry.is_expired() => {
                self.inner.stats.record_lazy_expiration();
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Removes `key` and returns the string it held.
    ///
    /// # Errors
    /// `ValueTypeMismatch` if the key holds a non-string value; the key is
    /// left in place.
    pub fn load_and_delete(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.inner.segment(key).write();
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(None);
        };
        if entry.is_expired() {
            entries.remove(key);
            self.inner.stats.record_lazy_expiration();
            return Ok(None);
        }
        let value = expect_kind(key, &entry, EntryKind::String, Entry::as_string)?
            .value()
            .to_string();
        entries.remove(key);
        Ok(Some(value))
    }

    // == Load Or Store ==
    /// Returns the existing string and `true`, or stores `value` and returns
    /// it with `false`.
    ///
    /// The check and the insert happen under one write lock, so concurrent
    /// first writers agree on a single winner.
    pub fn load_or_store(&self, key: &str, value: impl Into<String>) -> Result<(String, bool)> {
        self.load_or_put(key, value.into(), None)
    }

    /// Like [`load_or_store`](Self::load_or_store); a newly stored value
    /// expires after `ttl`.
    pub fn load_or_store_with_ttl(
        &self,
        key: &str,
        value: impl Into<String>,
        ttl: Duration,
    ) -> Result<(String, bool)> {
        self.load_or_put(key, value.into(), Some(ttl))
    }

    fn load_or_put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(String, bool)> {
        let mut entries = self.inner.segment(key).write();
        if let Some(existing) = entries.get(key) {
            if !existing.is_expired() {
                let string = expect_kind(key, existing, EntryKind::String, Entry::as_string)?;
                return Ok((string.value().to_string(), true));
            }
            self.inner.stats.record_lazy_expiration();
        }
        let entry = Arc::new(Entry::String(StringEntry::new(value.clone(), ttl)));
        entries.insert(key.to_string(), entry);
        Ok((value, false))
    }

    // == Expire ==
    /// Restarts the TTL of a live entry of any kind. A zero TTL deletes it.
    ///
    /// Returns false if the key does not exist.
    pub fn expire(&self, key: &str, ttl: Duration) -> bool {
        let Some(entry) = self.lookup(key) else {
            return false;
        };
        if ttl.is_zero() {
            entry.expire_now();
            self.evict_if_current(key, &entry);
        } else {
            entry.set_expiry(Some(ttl));
        }
        true
    }

    /// Removes the TTL of a live entry. Returns false if the key does not exist.
    pub fn persist(&self, key: &str) -> bool {
        match self.lookup(key) {
            Some(entry) => {
                entry.set_expiry(None);
                true
            }
            None => false,
        }
    }

    // == Reclamation ==
    /// Deletes expired entries within a scan budget and returns how many were removed.
    ///
    /// At most `max_percentage` percent of the current table is collected
    /// and scanning stops once `max_duration` has elapsed.
    pub fn reclaim_expired(&self, max_percentage: u8, max_duration: Duration) -> usize {
        self.inner.reclaim_expired(max_percentage, max_duration)
    }

    /// State of the background reclaimer, or None if active cleaning is off.
    pub fn reclaimer_state(&self) -> Option<ReclaimerState> {
        self.inner.reclaimer.as_ref().map(ReclaimerHandle::state)
    }

    /// Requests an immediate reclaim cycle. Returns false if active cleaning is off.
    pub fn trigger_reclaim(&self) -> bool {
        match &self.inner.reclaimer {
            Some(reclaimer) => {
                reclaimer.resume();
                true
            }
            None => false,
        }
    }

    // == Stats ==
    /// Returns current engine statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of keys in the table, including expired keys
    /// that have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    // == Is Empty ==
    /// Returns true if the table holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner
            .segments
            .iter()
            .all(|segment| segment.read().is_empty())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.len())
            .field("reclaimer", &self.reclaimer_state())
            .finish()
    }
}

impl StoreInner {
    fn new(rng: StdRng, seeded: bool, reclaimer: Option<ReclaimerHandle>) -> Self {
        Self {
            segments: (0..SEGMENT_COUNT)
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
            hasher: RandomState::new(),
            sweep_cursor: AtomicUsize::new(0),
            rng: Mutex::new(rng),
            seeded,
            stats: StatsRecorder::default(),
            reclaimer,
        }
    }

    fn segment(&self, key: &str) -> &Segment {
        let index = (self.hasher.hash_one(key) % SEGMENT_COUNT as u64) as usize;
        &self.segments[index]
    }

    fn len(&self) -> usize {
        self.segments.iter().map(|segment| segment.read().len()).sum()
    }

    /// Sweeps one segment at a time, so a write to any segment waits at
    /// most for a single segment's scan.
    fn reclaim_expired(&self, max_percentage: u8, max_duration: Duration) -> usize {
        // An unrepresentable deadline means no time limit
        let deadline = Instant::now().checked_add(max_duration);
        let max_examined = self.len() * usize::from(max_percentage.min(100)) / 100;
        let start = self.sweep_cursor.load(Ordering::Relaxed);

        let mut scanned = 0;
        let mut collected = 0;
        let mut removed = 0;
        for offset in 0..SEGMENT_COUNT {
            let index = (start + offset) % SEGMENT_COUNT;
            let segment = &self.segments[index];
            let mut exhausted = false;

            let batch: Vec<(String, Arc<Entry>)> = {
                let entries = segment.read();
                let mut batch = Vec::new();
                for (key, entry) in entries.iter() {
                    scanned += 1;
                    if entry.is_expired() {
                        batch.push((key.clone(), Arc::clone(entry)));
                        collected += 1;
                        if collected > max_examined {
                            exhausted = true;
                            break;
                        }
                    }
                    if scanned % DEADLINE_CHECK_INTERVAL == 0
                        && deadline.is_some_and(|deadline| Instant::now() >= deadline)
                    {
                        exhausted = true;
                        break;
                    }
                }
                batch
            };

            if !batch.is_empty() {
                let mut entries = segment.write();
                removed += batch
                    .into_iter()
                    .filter(|(key, entry)| remove_if_current(&mut entries, key, entry))
                    .count();
            }

            if exhausted {
                // Resume here next cycle so later segments are not starved
                self.sweep_cursor.store(index, Ordering::Relaxed);
                break;
            }
        }

        self.stats.record_reclaim_cycle(removed);
        removed
    }
}

impl Sweep for StoreInner {
    fn sweep(&self, settings: &ReclaimerSettings) -> usize {
        self.reclaim_expired(settings.max_percentage, settings.max_duration)
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}

fn remove_if_current(entries: &mut HashMap<String, Arc<Entry>>, key: &str, entry: &Arc<Entry>) -> bool {
    let is_current = entries
        .get(key)
        .is_some_and(|current| Arc::ptr_eq(current, entry));
    if is_current {
        entries.remove(key);
    }
    is_current
}

/// Views `entry` as the wanted kind or reports the mismatch.
pub(crate) fn expect_kind<'e, T>(
    key: &str,
    entry: &'e Entry,
    wanted: EntryKind,
    view: fn(&'e Entry) -> Option<&'e T>,
) -> Result<&'e T> {
    view(entry).ok_or_else(|| CacheError::mismatch(key, wanted, entry.kind()))
}
