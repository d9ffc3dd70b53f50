//! Image Cache Module
//!
//! Fetch-and-cache for remote images, persisted as inline `data:` URIs in
//! namespaced key/value storage with a global size cap.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::duration_ms;
use crate::clock::Clock;
use crate::images::key::{is_image_key, storage_key, to_data_uri};
use crate::images::{
    ImageCacheEntry, ImageFetcher, KeyValueStorage, DEFAULT_IMAGE_TTL_SECS, DEFAULT_MAX_ITEM_BYTES,
    DEFAULT_MAX_TOTAL_BYTES,
};

// == Configuration ==
/// Limits applied by an [`ImageCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCacheConfig {
    /// TTL for entries stored without an explicit one
    pub default_ttl: Duration,
    /// Cap on the summed footprint of all records
    pub max_total_bytes: usize,
    /// Largest encoded image accepted
    pub max_item_bytes: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_IMAGE_TTL_SECS),
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_item_bytes: DEFAULT_MAX_ITEM_BYTES,
        }
    }
}

// == Stats ==
/// Snapshot of image cache usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageCacheStats {
    pub total_entries: usize,
    /// Entries past expiry or unreadable, awaiting the next sweep
    pub expired_entries: usize,
    pub total_size_bytes: usize,
    pub max_size_bytes: usize,
    pub usage_percent: f64,
}

/// A namespaced record as found in storage.
struct StoredRecord {
    key: String,
    /// None when the record does not deserialize
    entry: Option<ImageCacheEntry>,
    /// Serialized length, the record's storage footprint
    footprint: usize,
}

// == Image Cache ==
/// Cheaply clonable handle to a size-bounded, TTL-bounded image cache.
///
/// Records are evicted oldest-write-first when a new one would not fit.
/// Reads do not refresh recency.
///
/// Every storage-touching operation holds a guard shared by all clones, so a
/// read, write or sweep runs to completion before the next one starts.
#[derive(Clone)]
pub struct ImageCache {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    fetcher: Arc<dyn ImageFetcher>,
    config: ImageCacheConfig,
    guard: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImageCache {
    // == Constructor ==
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        fetcher: Arc<dyn ImageFetcher>,
        config: ImageCacheConfig,
    ) -> Self {
        Self {
            storage,
            clock,
            fetcher,
            config,
            guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ImageCacheConfig {
        &self.config
    }

    // == Get ==
    /// Returns the cached `data:` URI for `url` if present and live.
    ///
    /// An absent or empty URL returns None without touching storage.
    pub fn get_cached_image(&self, url: Option<&str>) -> Option<String> {
        let url = url.filter(|u| !u.is_empty())?;
        let key = storage_key(url);
        let _guard = self.lock();

        let raw = match self.storage.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Image cache MISS: {}", url);
                return None;
            }
            Err(e) => {
                warn!("Image cache read failed for {}: {}", url, e);
                return None;
            }
        };

        match serde_json::from_str::<ImageCacheEntry>(&raw) {
            Ok(entry) if !entry.is_expired(self.clock.now_ms()) => {
                debug!("Image cache HIT: {}", url);
                Some(entry.data)
            }
            Ok(_) => {
                debug!("Image cache EXPIRED: {}", url);
                self.remove_quietly(&key);
                None
            }
            Err(e) => {
                warn!("Dropping corrupt image record for {}: {}", url, e);
                self.remove_quietly(&key);
                None
            }
        }
    }

    // == Set ==
    /// Stores `encoded` for `url`, evicting the oldest records if needed.
    ///
    /// Returns `false` without storing when either argument is empty, the
    /// content exceeds the per-item limit, or the storage write fails.
    pub fn set_cached_image(&self, url: &str, encoded: &str, ttl: Option<Duration>) -> bool {
        if url.is_empty() || encoded.is_empty() {
            return false;
        }
        if encoded.len() > self.config.max_item_bytes {
            debug!(
                "Not caching {}: {} bytes exceeds per-item limit of {}",
                url,
                encoded.len(),
                self.config.max_item_bytes
            );
            return false;
        }

        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = ImageCacheEntry::new(encoded.to_string(), self.clock.now_ms(), duration_ms(ttl));
        let record = match serde_json::to_string(&entry) {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to serialize image record for {}: {}", url, e);
                return false;
            }
        };
        if record.len() > self.config.max_total_bytes {
            return false;
        }

        let key = storage_key(url);
        let _guard = self.lock();
        // The record being replaced does not count against the new one
        let others: Vec<StoredRecord> = self
            .scan()
            .into_iter()
            .filter(|stored| stored.key != key)
            .collect();
        let current: usize = others.iter().map(|stored| stored.footprint).sum();

        if current + record.len() > self.config.max_total_bytes {
            let required = current + record.len() - self.config.max_total_bytes;
            self.evict(others, required);
        }

        match self.storage.set_item(&key, &record) {
            Ok(()) => {
                debug!("Cached image {} ({} bytes)", url, entry.size);
                true
            }
            Err(e) => {
                warn!("Image cache write failed for {}: {}", url, e);
                false
            }
        }
    }

    // == Fetch And Cache ==
    /// Returns an inline-encoded copy of `url`, fetching and caching it if needed.
    ///
    /// Never fails: on network errors or oversized bodies the original URL is
    /// returned so the caller can load it directly.
    pub async fn fetch_and_cache_image(&self, url: &str) -> String {
        if url.is_empty() {
            return String::new();
        }
        let owned = url.to_string();
        let cached = self
            .off_worker(move |cache| cache.get_cached_image(Some(&owned)))
            .await
            .flatten();
        if let Some(cached) = cached {
            return cached;
        }

        let image = match self.fetcher.fetch(url).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Image fetch failed for {}: {}", url, e);
                return url.to_string();
            }
        };

        if image.bytes.len() > self.config.max_item_bytes {
            debug!(
                "Image {} is {} bytes, over the per-item limit; serving original URL",
                url,
                image.bytes.len()
            );
            return url.to_string();
        }

        let encoded = to_data_uri(image.content_type.as_deref(), &image.bytes);
        let (owned_url, owned_encoded) = (url.to_string(), encoded.clone());
        let stored = self
            .off_worker(move |cache| cache.set_cached_image(&owned_url, &owned_encoded, None))
            .await
            .unwrap_or(false);
        if !stored {
            debug!("Image {} fetched but not cached", url);
        }
        encoded
    }

    // == Renderer Accessor ==
    /// Returns something displayable for `url` without waiting on the network.
    ///
    /// Cached content is returned directly. Otherwise a background fetch is
    /// submitted and the original URL is returned as the interim source.
    pub fn resolve_image_source(&self, url: Option<&str>) -> Option<String> {
        let url = url.filter(|u| !u.is_empty())?;
        if let Some(cached) = self.get_cached_image(Some(url)) {
            return Some(cached);
        }
        self.prefetch(url);
        Some(url.to_string())
    }

    /// Submits a background `fetch_and_cache_image` on the current runtime.
    ///
    /// Returns None (and does nothing) when called outside a tokio runtime.
    pub fn prefetch(&self, url: &str) -> Option<JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("No async runtime; skipping background fetch of {}", url);
                return None;
            }
        };

        let cache = self.clone();
        let url = url.to_string();
        Some(handle.spawn(async move {
            cache.fetch_and_cache_image(&url).await;
        }))
    }

    // == Clear ==
    /// Removes every record in the image namespace. Returns the number removed.
    pub fn clear_image_cache(&self) -> usize {
        let _guard = self.lock();
        let removed = self
            .namespace_keys()
            .iter()
            .filter(|key| self.remove_quietly(key))
            .count();
        info!("Image cache cleared: {} records removed", removed);
        removed
    }

    // == Cleanup Expired ==
    /// Removes expired and unreadable records. Returns the number removed.
    pub fn cleanup_expired_images(&self) -> usize {
        let _guard = self.lock();
        let now = self.clock.now_ms();
        self.scan()
            .into_iter()
            .filter(|stored| match &stored.entry {
                Some(entry) => entry.is_expired(now),
                None => true,
            })
            .filter(|stored| self.remove_quietly(&stored.key))
            .count()
    }

    // == Size ==
    /// Total footprint of all records in the namespace, measured from storage.
    pub fn get_image_cache_size(&self) -> usize {
        let _guard = self.lock();
        self.scan().iter().map(|stored| stored.footprint).sum()
    }

    // == Stats ==
    pub fn get_image_cache_stats(&self) -> ImageCacheStats {
        let now = self.clock.now_ms();
        let records = {
            let _guard = self.lock();
            self.scan()
        };
        let total_size_bytes: usize = records.iter().map(|stored| stored.footprint).sum();
        let expired_entries = records
            .iter()
            .filter(|stored| stored.entry.as_ref().map_or(true, |e| e.is_expired(now)))
            .count();
        let usage_percent = if self.config.max_total_bytes == 0 {
            0.0
        } else {
            total_size_bytes as f64 / self.config.max_total_bytes as f64 * 100.0
        };

        ImageCacheStats {
            total_entries: records.len(),
            expired_entries,
            total_size_bytes,
            max_size_bytes: self.config.max_total_bytes,
            usage_percent,
        }
    }

    // == Internals ==
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs storage-bound `work` on the blocking pool so filesystem access
    /// never stalls an async worker. Runs inline outside a runtime.
    ///
    /// None if the blocking task panicked.
    async fn off_worker<T, F>(&self, work: F) -> Option<T>
    where
        F: FnOnce(&ImageCache) -> T + Send + 'static,
        T: Send + 'static,
    {
        let cache = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => match handle.spawn_blocking(move || work(&cache)).await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Image cache storage task failed: {}", e);
                    None
                }
            },
            Err(_) => Some(work(&cache)),
        }
    }

    fn namespace_keys(&self) -> Vec<String> {
        match self.storage.keys() {
            Ok(keys) => keys.into_iter().filter(|key| is_image_key(key)).collect(),
            Err(e) => {
                warn!("Failed to enumerate image cache keys: {}", e);
                Vec::new()
            }
        }
    }

    fn scan(&self) -> Vec<StoredRecord> {
        self.namespace_keys()
            .into_iter()
            .filter_map(|key| match self.storage.get_item(&key) {
                Ok(Some(raw)) => Some(StoredRecord {
                    entry: serde_json::from_str(&raw).ok(),
                    footprint: raw.len(),
                    key,
                }),
                Ok(None) => None,
                Err(e) => {
                    warn!("Failed to read image record {}: {}", key, e);
                    None
                }
            })
            .collect()
    }

    /// Removes records oldest-first until at least `required` bytes are freed.
    /// Unreadable records count as oldest.
    fn evict(&self, mut records: Vec<StoredRecord>, required: usize) {
        records.sort_by_key(|stored| stored.entry.as_ref().map_or(0, |e| e.created_at));

        let mut freed = 0;
        let mut evicted = 0;
        for stored in records {
            if freed >= required {
                break;
            }
            if self.remove_quietly(&stored.key) {
                freed += stored.footprint;
                evicted += 1;
            }
        }
        info!("Image cache evicted {} records ({} bytes)", evicted, freed);
    }

    fn remove_quietly(&self, key: &str) -> bool {
        match self.storage.remove_item(key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to remove image record {}: {}", key, e);
                false
            }
        }
    }
}
