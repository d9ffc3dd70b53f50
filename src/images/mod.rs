//! Image Cache Module
//!
//! Persistent, size-bounded TTL cache for remote images.

mod entry;
mod fetch;
mod key;
mod storage;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::ImageCacheEntry;
pub use fetch::{FetchedImage, HttpFetcher, ImageFetcher};
pub use key::{storage_key, to_data_uri, KEY_PREFIX};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageResult};
pub use store::{ImageCache, ImageCacheConfig, ImageCacheStats};

// == Public Constants ==
/// Default lifetime of a cached image (15 minutes)
pub const DEFAULT_IMAGE_TTL_SECS: u64 = 15 * 60;

/// Default cap on total cached bytes (10 MiB)
pub const DEFAULT_MAX_TOTAL_BYTES: usize = 10 * 1024 * 1024;

/// Default cap on a single encoded image (2 MiB)
pub const DEFAULT_MAX_ITEM_BYTES: usize = 2 * 1024 * 1024;

/// Default interval between image cache sweeps (10 minutes)
pub const DEFAULT_IMAGE_SWEEP_SECS: u64 = 10 * 60;
