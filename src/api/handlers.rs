//! API Handlers
//!
//! HTTP request handlers exposing both caches for inspection and maintenance.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tokio::sync::RwLock;

use crate::cache::ResponseCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::images::{FileStorage, HttpFetcher, ImageCache, ImageCacheStats};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, ImageQuery, ImageResponse, InvalidateRequest,
    RemovedResponse, ResponseStatsResponse, SetRequest, SetResponse,
};

/// Timeout for a single upstream image download
const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Response cache behind an async lock
    pub responses: Arc<RwLock<ResponseCache>>,
    /// Image cache handle (internally shared)
    pub images: ImageCache,
}

impl AppState {
    pub fn new(responses: ResponseCache, images: ImageCache) -> Self {
        Self {
            responses: Arc::new(RwLock::new(responses)),
            images,
        }
    }

    /// Builds both caches from configuration, using the wall clock,
    /// file-backed image storage and an HTTP fetcher.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let responses = ResponseCache::new(config.response_ttl(), clock.clone());

        let storage = FileStorage::open(&config.image_cache_dir)?;
        let fetcher = HttpFetcher::new(IMAGE_FETCH_TIMEOUT)?;
        let images = ImageCache::new(
            Arc::new(storage),
            clock,
            Arc::new(fetcher),
            config.image_cache_config(),
        );

        Ok(Self::new(responses, images))
    }
}

// == Response Cache Handlers ==

/// Handler for PUT /responses
pub async fn set_response_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs);
    state.responses.write().await.set(req.key.clone(), req.value, ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /responses/:key
pub async fn get_response_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: an expired entry is removed on read
    let value = state
        .responses
        .write()
        .await
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /responses/:key
pub async fn delete_response_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.responses.write().await.invalidate(&key) {
        return Err(CacheError::NotFound(key));
    }
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /responses/invalidate
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<RemovedResponse>> {
    let removed = state
        .responses
        .write()
        .await
        .invalidate_pattern_str(&req.pattern)?;
    Ok(Json(RemovedResponse::new(removed)))
}

/// Handler for DELETE /responses
pub async fn clear_responses_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let mut cache = state.responses.write().await;
    let removed = cache.len();
    cache.clear();
    Json(RemovedResponse::new(removed))
}

/// Handler for POST /responses/cleanup
pub async fn cleanup_responses_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.responses.write().await.cleanup_expired();
    Json(RemovedResponse::new(removed))
}

/// Handler for GET /responses/stats
pub async fn response_stats_handler(State(state): State<AppState>) -> Json<ResponseStatsResponse> {
    let stats = state.responses.read().await.stats();
    Json(stats.into())
}

// == Image Cache Handlers ==

/// Handler for GET /images?url=
///
/// Returns the inline copy of `url`, fetching and caching it first if needed.
pub async fn image_handler(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Json<ImageResponse>> {
    if query.url.is_empty() {
        return Err(CacheError::InvalidRequest("url cannot be empty".to_string()));
    }
    let src = state.images.fetch_and_cache_image(&query.url).await;
    Ok(Json(ImageResponse::new(query.url, src)))
}

/// Handler for GET /images/stats
pub async fn image_stats_handler(State(state): State<AppState>) -> Result<Json<ImageCacheStats>> {
    let stats = on_blocking_pool(&state.images, ImageCache::get_image_cache_stats).await?;
    Ok(Json(stats))
}

/// Handler for DELETE /images
pub async fn clear_images_handler(State(state): State<AppState>) -> Result<Json<RemovedResponse>> {
    let removed = on_blocking_pool(&state.images, ImageCache::clear_image_cache).await?;
    Ok(Json(RemovedResponse::new(removed)))
}

/// Handler for POST /images/cleanup
pub async fn cleanup_images_handler(
    State(state): State<AppState>,
) -> Result<Json<RemovedResponse>> {
    let removed = on_blocking_pool(&state.images, ImageCache::cleanup_expired_images).await?;
    Ok(Json(RemovedResponse::new(removed)))
}

/// Runs image cache maintenance on the blocking pool; it reads every record
/// from storage.
async fn on_blocking_pool<T, F>(images: &ImageCache, work: F) -> Result<T>
where
    F: FnOnce(&ImageCache) -> T + Send + 'static,
    T: Send + 'static,
{
    let images = images.clone();
    tokio::task::spawn_blocking(move || work(&images))
        .await
        .map_err(|e| CacheError::Internal(format!("image cache task failed: {}", e)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::FetchError;
    use crate::images::{FetchedImage, ImageCacheConfig, ImageFetcher, MemoryStorage};
    use async_trait::async_trait;
    use serde_json::json;

    struct Offline;

    #[async_trait]
    impl ImageFetcher for Offline {
        async fn fetch(&self, _url: &str) -> std::result::Result<FetchedImage, FetchError> {
            Err(FetchError::Status(503))
        }
    }

    fn test_state() -> AppState {
        let clock = Arc::new(ManualClock::new(0));
        let responses = ResponseCache::new(Duration::from_secs(900), clock.clone());
        let images = ImageCache::new(
            Arc::new(MemoryStorage::new()),
            clock,
            Arc::new(Offline),
            ImageCacheConfig::default(),
        );
        AppState::new(responses, images)
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "categories:list".to_string(),
            value: json!(["phones"]),
            ttl: None,
        };
        assert!(set_response_handler(State(state.clone()), Json(req)).await.is_ok());

        let response = get_response_handler(State(state), Path("categories:list".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!(["phones"]));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();
        let result = get_response_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_key() {
        let state = test_state();
        let result = delete_response_handler(State(state), Path("missing".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_bad_pattern() {
        let state = test_state();
        let req = InvalidateRequest {
            pattern: "[".to_string(),
        };
        let result = invalidate_pattern_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();
        let req = SetRequest {
            key: "".to_string(),
            value: json!(1),
            ttl: None,
        };
        assert!(set_response_handler(State(state), Json(req)).await.is_err());
    }

    #[tokio::test]
    async fn test_image_handler_falls_back_to_url() {
        let state = test_state();
        let query = ImageQuery {
            url: "http://x/img.png".to_string(),
        };
        let response = image_handler(State(state), Query(query)).await.unwrap();
        assert_eq!(response.src, "http://x/img.png");
        assert!(!response.inline);
    }

    #[tokio::test]
    async fn test_image_maintenance_handlers() {
        let state = test_state();
        state
            .images
            .set_cached_image("http://x/a.png", "data:,a", None);

        let stats = image_stats_handler(State(state.clone())).await.unwrap();
        assert_eq!(stats.total_entries, 1);

        let cleaned = cleanup_images_handler(State(state.clone())).await.unwrap();
        assert_eq!(cleaned.removed, 0);

        let cleared = clear_images_handler(State(state.clone())).await.unwrap();
        assert_eq!(cleared.removed, 1);
    }

    #[tokio::test]
    async fn test_blocking_task_panic_maps_to_internal() {
        let state = test_state();
        let result: Result<()> = on_blocking_pool(&state.images, |_| panic!("storage gone")).await;
        assert!(matches!(result, Err(CacheError::Internal(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
