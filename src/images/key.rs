//! Storage key derivation and inline image encoding.

use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Namespace prefix for every image cache record in shared storage.
pub const KEY_PREFIX: &str = "img_cache_";

/// Hex characters of the URL digest kept in the key (128 bits).
const DIGEST_HEX_LEN: usize = 32;

/// MIME type used when the origin does not declare one.
pub const FALLBACK_MIME: &str = "application/octet-stream";

// == Storage Key ==
/// Maps a source URL to its fixed-length, namespaced storage key.
pub fn storage_key(url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    format!("{}{}", KEY_PREFIX, &digest[..DIGEST_HEX_LEN])
}

/// Whether `key` belongs to the image cache namespace.
pub fn is_image_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX)
}

// == Data URI ==
/// Encodes `bytes` as a `data:` URI usable directly as an image source.
///
/// Content-type parameters (`; charset=...`) are dropped.
pub fn to_data_uri(content_type: Option<&str>, bytes: &[u8]) -> String {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(FALLBACK_MIME);
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
