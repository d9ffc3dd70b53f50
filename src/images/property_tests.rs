//! Property-Based Tests for the Image Cache

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::error::FetchError;
use crate::images::{
    FetchedImage, ImageCache, ImageCacheConfig, ImageFetcher, KeyValueStorage, MemoryStorage,
};

/// Returns a body of the requested length for every URL.
struct SizedFetcher(usize);

#[async_trait]
impl ImageFetcher for SizedFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedImage, FetchError> {
        Ok(FetchedImage {
            bytes: vec![0xAB; self.0],
            content_type: Some("image/webp".to_string()),
        })
    }
}

fn cache_with(
    config: ImageCacheConfig,
    fetcher: Arc<dyn ImageFetcher>,
) -> (ImageCache, Arc<MemoryStorage>, Arc<ManualClock>) {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = ImageCache::new(storage.clone(), clock.clone(), fetcher, config);
    (cache, storage, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Total footprint never exceeds capacity, and the survivors are always
    // the most recently written images.
    #[test]
    fn prop_capacity_enforcement(
        capacity in 600usize..4_000,
        sizes in prop::collection::vec(1usize..500, 1..40),
    ) {
        let config = ImageCacheConfig {
            max_total_bytes: capacity,
            ..ImageCacheConfig::default()
        };
        let (cache, _, clock) = cache_with(config, Arc::new(SizedFetcher(0)));
        let mut written: Vec<String> = Vec::new();

        for (i, size) in sizes.iter().enumerate() {
            let url = format!("https://cdn.example.com/{}.png", i);
            prop_assert!(cache.set_cached_image(&url, &"A".repeat(*size), None));
            written.push(url);
            clock.advance(1);

            prop_assert!(
                cache.get_image_cache_size() <= capacity,
                "Size {} exceeds capacity {}",
                cache.get_image_cache_size(),
                capacity
            );

            let alive: Vec<bool> = written
                .iter()
                .map(|u| cache.get_cached_image(Some(u)).is_some())
                .collect();
            prop_assert!(*alive.last().unwrap(), "Newest write must survive");
            let first_alive = alive.iter().position(|a| *a).unwrap();
            prop_assert!(
                alive[first_alive..].iter().all(|a| *a),
                "Survivors must be a suffix of write order: {:?}",
                alive
            );
        }
    }

    // Encoded content over the per-item limit is never stored.
    #[test]
    fn prop_oversized_set_rejected(limit in 1usize..2_000, extra in 1usize..500) {
        let config = ImageCacheConfig {
            max_item_bytes: limit,
            ..ImageCacheConfig::default()
        };
        let (cache, storage, _) = cache_with(config, Arc::new(SizedFetcher(0)));

        prop_assert!(!cache.set_cached_image("https://cdn.example.com/big.png", &"A".repeat(limit + extra), None));
        prop_assert!(storage.keys().unwrap().is_empty());
    }

    // Fetched bodies over the per-item limit resolve to the original URL.
    #[test]
    fn prop_oversized_fetch_returns_url(limit in 1usize..2_000, extra in 1usize..500) {
        let config = ImageCacheConfig {
            max_item_bytes: limit,
            ..ImageCacheConfig::default()
        };
        let (cache, storage, _) = cache_with(config, Arc::new(SizedFetcher(limit + extra)));
        let url = "https://cdn.example.com/huge.png";

        let src = tokio_test::block_on(cache.fetch_and_cache_image(url));

        prop_assert_eq!(src, url);
        prop_assert!(storage.keys().unwrap().is_empty());
    }
}
