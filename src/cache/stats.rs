//! Cache Statistics Module
//!
//! Snapshot metrics for the response cache.

use serde::Serialize;

// == Response Cache Stats ==
/// Point-in-time view of the response cache, computed by scanning entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseCacheStats {
    /// All stored entries, live or not
    pub total_entries: usize,
    /// Entries with `now <= expires_at`
    pub active_entries: usize,
    /// Entries past expiry that have not been removed yet
    pub expired_entries: usize,
    /// Smallest `created_at` among stored entries
    pub oldest_entry_timestamp: Option<u64>,
    /// Largest `created_at` among stored entries
    pub newest_entry_timestamp: Option<u64>,
    /// Stored keys, sorted
    pub keys: Vec<String>,
    /// Number of successful lookups
    pub hits: u64,
    /// Number of lookups that found nothing live
    pub misses: u64,
}

impl ResponseCacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Lookup Counters ==
/// Hit/miss counters maintained by `get`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LookupCounters {
    pub hits: u64,
    pub misses: u64,
}

impl LookupCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }
}
