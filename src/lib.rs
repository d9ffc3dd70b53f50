//! Storefront Cache - client-side caching layer for the resale storefront
//!
//! Two independent caches: an in-memory TTL cache for JSON API responses and
//! a persistent, size-bounded TTL cache for fetched images.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod images;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::ResponseCache;
pub use config::Config;
pub use images::ImageCache;
pub use tasks::{spawn_image_sweeper, spawn_response_sweeper, SweepTask};
