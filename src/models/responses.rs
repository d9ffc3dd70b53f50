//! Response DTOs for the cache inspection API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::ResponseCacheStats;

/// Response body for `GET /responses/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for `PUT /responses`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for `DELETE /responses/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for bulk removals (invalidate, clear, cleanup)
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of entries removed
    pub removed: usize,
}

impl RemovedResponse {
    pub fn new(removed: usize) -> Self {
        Self { removed }
    }
}

/// Response body for `GET /responses/stats`
#[derive(Debug, Clone, Serialize)]
pub struct ResponseStatsResponse {
    #[serde(flatten)]
    pub stats: ResponseCacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<ResponseCacheStats> for ResponseStatsResponse {
    fn from(stats: ResponseCacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for `GET /images`
#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    /// The requested source URL
    pub url: String,
    /// Inline `data:` URI, or the original URL when caching was not possible
    pub src: String,
    /// Whether `src` is inline content
    pub inline: bool,
}

impl ImageResponse {
    pub fn new(url: impl Into<String>, src: String) -> Self {
        let url = url.into();
        let inline = src != url;
        Self { url, src, inline }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_stats_response_flattens() {
        let stats = ResponseCacheStats {
            total_entries: 2,
            hits: 4,
            misses: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(ResponseStatsResponse::from(stats)).unwrap();
        assert_eq!(json["total_entries"], 2);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_image_response_inline_flag() {
        let cached = ImageResponse::new("http://x/a.png", "data:image/png;base64,AA==".to_string());
        assert!(cached.inline);

        let fallback = ImageResponse::new("http://x/a.png", "http://x/a.png".to_string());
        assert!(!fallback.inline);
    }

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("brand:1", json!({"id": 1}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["value"]["id"], 1);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
