//! Address syntax checks
//!
//! Addresses are uncompressed secp256k1 public keys in hex. The check is
//! purely syntactic; whether the point lies on the curve is left to the
//! signature engine.

/// Length of a hex-encoded uncompressed public key
pub const ADDRESS_LENGTH: usize = 130;

/// Marker byte of an uncompressed EC point, hex-encoded
pub const ADDRESS_PREFIX: &str = "04";

/// Check that `address` is `04` followed by 128 hex digits
pub fn is_valid_address(address: &str) -> bool {
    if address.len() != ADDRESS_LENGTH {
        log::debug!(
            "Invalid address length: expected {}, got {}",
            ADDRESS_LENGTH,
            address.len()
        );
        return false;
    }
    if !address.chars().all(|c| c.is_ascii_hexdigit()) {
        log::debug!("Address must contain only hex characters");
        return false;
    }
    if !address.starts_with(ADDRESS_PREFIX) {
        log::debug!("Address must start with {}", ADDRESS_PREFIX);
        return false;
    }
    true
}
