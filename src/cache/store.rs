//! Response Cache Module
//!
//! In-memory TTL cache for JSON API responses, keyed by caller-supplied strings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::stats::LookupCounters;
use crate::cache::{CacheEntry, ResponseCacheStats};
use crate::clock::Clock;
use crate::error::{CacheError, Result};

// == Response Cache ==
/// Volatile key/value cache with lazy expiry on read.
///
/// Expired entries are never returned by [`ResponseCache::get`]; periodic
/// [`ResponseCache::cleanup_expired`] only reclaims memory.
pub struct ResponseCache {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<Value>>,
    /// Lookup counters
    counters: LookupCounters,
    /// TTL applied when `set` is given none
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl ResponseCache {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL for entries stored without an explicit one
    /// * `clock` - Time source used for every expiry decision
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            counters: LookupCounters::default(),
            default_ttl,
            clock,
        }
    }

    // == Get ==
    /// Returns the stored value for `key` if it is still live.
    ///
    /// An expired entry is removed on the way out.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                self.counters.record_hit();
                debug!("Response cache HIT: {}", key);
                Some(entry.data.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.counters.record_miss();
                debug!("Response cache EXPIRED: {}", key);
                None
            }
            None => {
                self.counters.record_miss();
                debug!("Response cache MISS: {}", key);
                None
            }
        }
    }

    /// Like [`ResponseCache::get`], deserializing into `T`.
    ///
    /// A stored value of a different shape is reported as absent.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!("Response cache value for {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Returns the full entry (timestamps included) for a live key.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<Value>> {
        let now = self.clock.now_ms();
        self.entries.get(key).filter(|entry| entry.is_live(now))
    }

    // == Set ==
    /// Stores `data` under `key`, replacing any existing entry.
    ///
    /// # Arguments
    /// * `key` - Caller-defined key, e.g. `"brand:42:models"`
    /// * `data` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: impl Into<String>, data: Value, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(data, self.clock.now_ms(), duration_ms(ttl));
        self.entries.insert(key.into(), entry);
    }

    /// Serializes `data` to JSON and stores it.
    ///
    /// Returns `false` (and stores nothing) if `data` cannot be represented as JSON.
    pub fn set_json<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        data: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let key = key.into();
        match serde_json::to_value(data) {
            Ok(value) => {
                self.set(key, value, ttl);
                true
            }
            Err(e) => {
                debug!("Skipping cache write for {}: {}", key, e);
                false
            }
        }
    }

    // == Invalidate ==
    /// Removes exactly one entry. Returns whether it existed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry whose key matches `pattern`. Returns the number removed.
    pub fn invalidate_pattern(&mut self, pattern: &Regex) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.is_match(key));
        let removed = before - self.entries.len();
        debug!("Invalidated {} entries matching {}", removed, pattern);
        removed
    }

    /// Compiles `pattern` as a regular expression and invalidates matching keys.
    pub fn invalidate_pattern_str(&mut self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)
            .map_err(|e| CacheError::InvalidRequest(format!("Invalid pattern: {}", e)))?;
        Ok(self.invalidate_pattern(&regex))
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Stats ==
    /// Partitions stored entries by liveness. Never removes anything.
    pub fn stats(&self) -> ResponseCacheStats {
        let now = self.clock.now_ms();
        let active_entries = self
            .entries
            .values()
            .filter(|entry| entry.is_live(now))
            .count();

        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        ResponseCacheStats {
            total_entries: self.entries.len(),
            active_entries,
            expired_entries: self.entries.len() - active_entries,
            oldest_entry_timestamp: self.entries.values().map(|e| e.created_at).min(),
            newest_entry_timestamp: self.entries.values().map(|e| e.created_at).max(),
            keys,
            hits: self.counters.hits,
            misses: self.counters.misses,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

pub(crate) fn duration_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}
