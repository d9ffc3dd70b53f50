//! Cache Entry Module
//!
//! Defines the structure for individual response cache entries with TTL support.

// == Cache Entry ==
/// A single cached value with its creation and expiry timestamps.
///
/// Entries are never updated in place; a new `set` replaces the whole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The stored value, opaque to the cache
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), always `created_at + ttl`
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry stamped at `now_ms` that lives for `ttl_ms`.
    pub fn new(data: T, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            data,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Live ==
    /// An entry is live while `now <= expires_at`.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms <= self.expires_at
    }

    // == Is Expired ==
    pub fn is_expired(&self, now_ms: u64) -> bool {
        !self.is_live(now_ms)
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value", 1_000, 500);

        assert_eq!(entry.data, "test_value");
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.expires_at, 1_500);
    }

    #[test]
    fn test_entry_live_until_expiry_inclusive() {
        let entry = CacheEntry::new(1, 1_000, 500);

        assert!(entry.is_live(1_000));
        assert!(entry.is_live(1_500), "Entry should be live at its expiry instant");
        assert!(entry.is_expired(1_501));
    }

    #[test]
    fn test_zero_ttl_is_live_only_at_creation() {
        let entry = CacheEntry::new((), 42, 0);

        assert!(entry.is_live(42));
        assert!(entry.is_expired(43));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("v", 0, 10_000);

        assert_eq!(entry.ttl_remaining_ms(0), 10_000);
        assert_eq!(entry.ttl_remaining_ms(9_000), 1_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new("v", u64::MAX - 1, 10);
        assert_eq!(entry.expires_at, u64::MAX);
    }
}
