//! API Routes
//!
//! Configures the Axum router with all cache inspection endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_images_handler, cleanup_responses_handler, clear_images_handler,
    clear_responses_handler, delete_response_handler, get_response_handler, health_handler,
    image_handler, image_stats_handler, invalidate_pattern_handler, response_stats_handler,
    set_response_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /responses` - Cache a JSON payload
/// - `DELETE /responses` - Clear the response cache
/// - `GET /responses/stats` - Response cache statistics
/// - `POST /responses/invalidate` - Invalidate keys matching a pattern
/// - `POST /responses/cleanup` - Sweep expired responses
/// - `GET /responses/:key` - Read a cached payload
/// - `DELETE /responses/:key` - Invalidate one key
/// - `GET /images?url=` - Fetch-and-cache an image
/// - `DELETE /images` - Clear the image cache
/// - `GET /images/stats` - Image cache statistics
/// - `POST /images/cleanup` - Sweep expired images
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/responses",
            put(set_response_handler).delete(clear_responses_handler),
        )
        .route("/responses/stats", get(response_stats_handler))
        .route("/responses/invalidate", post(invalidate_pattern_handler))
        .route("/responses/cleanup", post(cleanup_responses_handler))
        .route(
            "/responses/:key",
            get(get_response_handler).delete(delete_response_handler),
        )
        .route("/images", get(image_handler).delete(clear_images_handler))
        .route("/images/stats", get(image_stats_handler))
        .route("/images/cleanup", post(cleanup_images_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::clock::ManualClock;
    use crate::error::FetchError;
    use crate::images::{FetchedImage, ImageCache, ImageCacheConfig, ImageFetcher, MemoryStorage};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    struct Offline;

    #[async_trait]
    impl ImageFetcher for Offline {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage, FetchError> {
            Err(FetchError::Transport("offline".to_string()))
        }
    }

    fn create_test_app() -> Router {
        let clock = Arc::new(ManualClock::new(0));
        let images = ImageCache::new(
            Arc::new(MemoryStorage::new()),
            clock.clone(),
            Arc::new(Offline),
            ImageCacheConfig::default(),
        );
        let responses = ResponseCache::new(Duration::from_secs(900), clock);
        create_router(AppState::new(responses, images))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of(create_test_app(), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoints() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/responses/stats").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(create_test_app(), "GET", "/images/stats").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_get_not_found() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/responses/nonexistent").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_image_missing_query() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/images").await,
            StatusCode::BAD_REQUEST
        );
    }
}
