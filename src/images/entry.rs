//! Image Cache Entry Module
//!
//! Serialized record stored per cached image.

use serde::{Deserialize, Serialize};

// == Image Cache Entry ==
/// One cached image as persisted in key/value storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCacheEntry {
    /// Inline-encoded image (`data:` URI)
    pub data: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Byte length of `data`, computed once at write time
    pub size: usize,
}

impl ImageCacheEntry {
    pub fn new(data: String, now_ms: u64, ttl_ms: u64) -> Self {
        let size = data.len();
        Self {
            data,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            size,
        }
    }

    /// Same boundary as the response cache: live while `now <= expires_at`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_computed_at_creation() {
        let entry = ImageCacheEntry::new("data:image/png;base64,AAAA".to_string(), 10, 5);
        assert_eq!(entry.size, 26);
        assert_eq!(entry.expires_at, 15);
        assert!(!entry.is_expired(15));
        assert!(entry.is_expired(16));
    }

    #[test]
    fn test_record_json_shape() {
        let entry = ImageCacheEntry::new("x".to_string(), 1, 2);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"data":"x","created_at":1,"expires_at":3,"size":1}"#);
        assert_eq!(serde_json::from_str::<ImageCacheEntry>(&json).unwrap(), entry);
    }
}
