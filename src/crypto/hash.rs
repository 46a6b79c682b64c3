//! SHA-256 hashing used for transaction ids
//!
//! A transaction id is the hex encoding of a single SHA-256 over the
//! transaction's content string.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Digest a signing payload down to the 32 bytes ECDSA operates on.
///
/// Transaction ids are already hex-encoded SHA-256 digests, so they are
/// decoded and used directly. Anything else is hashed first.
pub fn message_digest(message: &str) -> Vec<u8> {
    match hex::decode(message) {
        Ok(bytes) if bytes.len() == 32 => bytes,
        _ => sha256(message.as_bytes()),
    }
}
