//! Content digests.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of content as lowercase hex.
///
/// Identical bytes always yield the identical digest; the analyze upload
/// sends this as its idempotency key so a retried submission of the same
/// file is recognized as the same logical request by the backend.
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
