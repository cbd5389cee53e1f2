//! Cache Statistics Module
//!
//! Tracks how entries leave the store: lazily on access or through the
//! background reclaimer.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of engine statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Current number of keys in the table, expired ones not yet reclaimed included
    pub total_entries: usize,
    /// Entries removed because an access found them expired
    pub lazy_expirations: u64,
    /// Entries removed by reclaim cycles
    pub reclaimed_entries: u64,
    /// Completed reclaim cycles
    pub reclaim_cycles: u64,
}

impl CacheStats {
    /// Share of expired entries removed by the reclaimer rather than on access.
    ///
    /// Returns 0.0 if nothing has expired yet.
    pub fn active_reclaim_ratio(&self) -> f64 {
        let total = self.lazy_expirations + self.reclaimed_entries;
        if total == 0 {
            0.0
        } else {
            self.reclaimed_entries as f64 / total as f64
        }
    }
}

/// Lock-free counters updated by the store.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    lazy_expirations: AtomicU64,
    reclaimed_entries: AtomicU64,
    reclaim_cycles: AtomicU64,
}

impl StatsRecorder {
    pub fn record_lazy_expiration(&self) {
        self.lazy_expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reclaim_cycle(&self, removed: usize) {
        self.reclaimed_entries
            .fetch_add(removed as u64, Ordering::Relaxed);
        self.reclaim_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            total_entries,
            lazy_expirations: self.lazy_expirations.load(Ordering::Relaxed),
            reclaimed_entries: self.reclaimed_entries.load(Ordering::Relaxed),
            reclaim_cycles: self.reclaim_cycles.load(Ordering::Relaxed),
        }
    }
}
