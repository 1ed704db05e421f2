//! Content addressing for indexed media.
//!
//! A document key is the BLAKE3 digest of the file's path, not of its bytes:
//! re-crawling the same tree yields the same keys, so re-indexing replaces
//! documents instead of duplicating them.

use std::path::Path;

pub type ContentId = String;

/// Hex-encoded BLAKE3 digest of the path's raw OS bytes.
///
/// Hashes the encoded bytes rather than a lossy string, so names that are not
/// valid UTF-8 still get distinct ids.
pub fn content_id(path: &Path) -> ContentId {
    let h = blake3::hash(path.as_os_str().as_encoded_bytes());
    h.to_hex().to_string()
}
