//! API Module
//!
//! HTTP handlers and routing for inspecting and maintaining both caches.
//! See [`routes::create_router`] for the endpoint list.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
