//! ECDSA key management for the ledger
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve. An address is the hex encoding of the
//! uncompressed public key (`04` followed by the X and Y coordinates).

use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::message_digest;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (uncompressed, 65 bytes)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize_uncompressed())
    }

    /// The address that outputs paying this key are locked to
    pub fn address(&self) -> String {
        self.public_key_hex()
    }

    /// Sign a message with the private key, returning a hex DER signature
    pub fn sign(&self, message: &str) -> Result<String, KeyError> {
        sign_with_secret(&self.secret_key, message)
    }

    /// Verify a signature against this key pair's public key
    pub fn verify(&self, message: &str, signature: &str) -> bool {
        verify(&self.address(), message, signature)
    }
}

/// Derive the address belonging to a hex-encoded private key
pub fn public_key_of(private_key_hex: &str) -> Result<String, KeyError> {
    Ok(KeyPair::from_private_key_hex(private_key_hex)?.address())
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign `message` with a hex-encoded private key
pub fn sign(message: &str, private_key_hex: &str) -> Result<String, KeyError> {
    let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
    key_pair.sign(message)
}

fn sign_with_secret(secret_key: &SecretKey, message: &str) -> Result<String, KeyError> {
    let secp = Secp256k1::new();
    let digest = message_digest(message);
    let message = Message::from_digest_slice(&digest)?;
    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(hex::encode(signature.serialize_der().to_vec()))
}

/// Check a hex DER signature over `message` against an address.
///
/// Malformed addresses or signatures verify as `false`; they are untrusted
/// input, not caller errors.
pub fn verify(address: &str, message: &str, signature: &str) -> bool {
    match try_verify(address, message, signature) {
        Ok(valid) => valid,
        Err(e) => {
            log::debug!("Signature check against {} failed to parse: {}", address, e);
            false
        }
    }
}

fn try_verify(address: &str, message: &str, signature: &str) -> Result<bool, KeyError> {
    let secp = Secp256k1::verification_only();
    let public_key = public_key_from_hex(address)?;

    let digest = message_digest(message);
    let message = Message::from_digest_slice(&digest)?;

    let bytes = hex::decode(signature).map_err(|_| KeyError::InvalidSignature)?;
    let mut sig = Signature::from_der(&bytes).map_err(|_| KeyError::InvalidSignature)?;
    // Accept high-S encodings from other signers
    sig.normalize_s();

    Ok(secp.verify_ecdsa(&message, &sig, &public_key).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256_hex;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.address().len(), 130);
        assert!(kp.address().starts_with("04"));
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let message = sha256_hex(b"Hello, blockchain!");

        let signature = kp.sign(&message).unwrap();
        assert!(kp.verify(&message, &signature));
        assert!(verify(&kp.address(), &message, &signature));
    }

    #[test]
    fn test_verify_rejects_other_address() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let message = sha256_hex(b"payload");

        let signature = sign(&message, &kp.private_key_hex()).unwrap();
        assert!(!verify(&other.address(), &message, &signature));
    }

    #[test]
    fn test_verify_rejects_other_message() {
        let kp = KeyPair::generate();
        let signature = kp.sign(&sha256_hex(b"one")).unwrap();
        assert!(!kp.verify(&sha256_hex(b"two"), &signature));
    }

    #[test]
    fn test_verify_tolerates_garbage() {
        let kp = KeyPair::generate();
        let message = sha256_hex(b"payload");

        assert!(!verify(&kp.address(), &message, "not hex"));
        assert!(!verify(&kp.address(), &message, "deadbeef"));
        assert!(!verify("04aa", &message, &kp.sign(&message).unwrap()));
    }

    #[test]
    fn test_public_key_of() {
        let kp = KeyPair::generate();
        assert_eq!(public_key_of(&kp.private_key_hex()).unwrap(), kp.address());
        assert!(public_key_of("zz").is_err());
        assert!(public_key_of(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
    }
}
