//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing for transaction ids
//! - ECDSA key management and signatures (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{message_digest, sha256, sha256_hex};
pub use keys::{public_key_from_hex, public_key_of, sign, verify, KeyError, KeyPair};
