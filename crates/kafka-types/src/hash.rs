//! Content hashing for record keys and values.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
