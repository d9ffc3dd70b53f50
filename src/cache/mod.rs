//! Cache Module
//!
//! Provides the in-memory response cache with TTL expiration.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::ResponseCacheStats;
pub use store::ResponseCache;

pub(crate) use store::duration_ms;

// == Public Constants ==
/// Default lifetime of a cached catalog response (15 minutes)
pub const DEFAULT_RESPONSE_TTL_SECS: u64 = 15 * 60;

/// Default interval between response cache sweeps (5 minutes)
pub const DEFAULT_RESPONSE_SWEEP_SECS: u64 = 5 * 60;
