//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_RESPONSE_SWEEP_SECS, DEFAULT_RESPONSE_TTL_SECS};
use crate::images::{
    ImageCacheConfig, DEFAULT_IMAGE_SWEEP_SECS, DEFAULT_IMAGE_TTL_SECS, DEFAULT_MAX_ITEM_BYTES,
    DEFAULT_MAX_TOTAL_BYTES,
};

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default response cache TTL in seconds
    pub response_ttl: u64,
    /// Response cache sweep interval in seconds
    pub response_sweep_interval: u64,
    /// Default image cache TTL in seconds
    pub image_ttl: u64,
    /// Cap on total cached image bytes
    pub image_max_total_bytes: usize,
    /// Cap on a single encoded image
    pub image_max_item_bytes: usize,
    /// Image cache sweep interval in seconds
    pub image_sweep_interval: u64,
    /// Directory backing the durable image store
    pub image_cache_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `RESPONSE_TTL` - Response cache TTL in seconds (default: 900)
    /// - `RESPONSE_SWEEP_INTERVAL` - Response sweep frequency in seconds (default: 300)
    /// - `IMAGE_TTL` - Image cache TTL in seconds (default: 900)
    /// - `IMAGE_MAX_TOTAL_BYTES` - Image cache capacity (default: 10 MiB)
    /// - `IMAGE_MAX_ITEM_BYTES` - Largest cacheable image (default: 2 MiB)
    /// - `IMAGE_SWEEP_INTERVAL` - Image sweep frequency in seconds (default: 600)
    /// - `IMAGE_CACHE_DIR` - Image store directory (default: ./image-cache)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            response_ttl: env_or("RESPONSE_TTL", defaults.response_ttl),
            response_sweep_interval: env_or(
                "RESPONSE_SWEEP_INTERVAL",
                defaults.response_sweep_interval,
            ),
            image_ttl: env_or("IMAGE_TTL", defaults.image_ttl),
            image_max_total_bytes: env_or("IMAGE_MAX_TOTAL_BYTES", defaults.image_max_total_bytes),
            image_max_item_bytes: env_or("IMAGE_MAX_ITEM_BYTES", defaults.image_max_item_bytes),
            image_sweep_interval: env_or("IMAGE_SWEEP_INTERVAL", defaults.image_sweep_interval),
            image_cache_dir: env::var("IMAGE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.image_cache_dir),
        }
    }

    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl)
    }

    pub fn response_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.response_sweep_interval)
    }

    pub fn image_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.image_sweep_interval)
    }

    pub fn image_cache_config(&self) -> ImageCacheConfig {
        ImageCacheConfig {
            default_ttl: Duration::from_secs(self.image_ttl),
            max_total_bytes: self.image_max_total_bytes,
            max_item_bytes: self.image_max_item_bytes,
        }
    }
}

/// Parses `name` from the environment, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            response_ttl: DEFAULT_RESPONSE_TTL_SECS,
            response_sweep_interval: DEFAULT_RESPONSE_SWEEP_SECS,
            image_ttl: DEFAULT_IMAGE_TTL_SECS,
            image_max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            image_max_item_bytes: DEFAULT_MAX_ITEM_BYTES,
            image_sweep_interval: DEFAULT_IMAGE_SWEEP_SECS,
            image_cache_dir: PathBuf::from("./image-cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.response_ttl(), Duration::from_secs(900));
        assert_eq!(config.response_sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.image_sweep_interval(), Duration::from_secs(600));
        assert_eq!(config.image_cache_config(), ImageCacheConfig::default());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("STOREFRONT_CACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("STOREFRONT_CACHE_TEST_GARBAGE", 7u64), 7);

        env::set_var("STOREFRONT_CACHE_TEST_GARBAGE", "42");
        assert_eq!(env_or("STOREFRONT_CACHE_TEST_GARBAGE", 7u64), 42);
        env::remove_var("STOREFRONT_CACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_env_or_unset() {
        assert_eq!(env_or("STOREFRONT_CACHE_TEST_UNSET", 3u16), 3);
    }
}
