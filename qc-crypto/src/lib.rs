//! Cryptographic primitives for the quietchat handshake.
//!
//! Provides:
//! - [`AsymmetricKeypair`] — RSA keypair with PEM encode/decode and
//!   OAEP-SHA1 encrypt/decrypt, used to seal the first symmetric key.
//! - [`SymmetricKey`] — a 128-bit AES-GCM key generated fresh per session
//!   and never persisted.
//!
//! # A note on trust
//!
//! There is no PKI here: nothing ties a received public key to an identity
//! beyond what the two endpoints already know out of band. An active
//! man-in-the-middle on first connect can substitute its own key. This
//! mirrors the upstream protocol and is not addressed at this layer.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod keypair;
pub mod symmetric;

pub use keypair::AsymmetricKeypair;
pub use symmetric::SymmetricKey;

/// Errors raised by the crypto primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// PEM encoding of a key failed.
    #[error("failed to encode key as PEM: {0}")]
    Encode(String),
    /// PEM decoding of a key failed (malformed PEM, wrong key type, ...).
    #[error("failed to decode key from PEM: {0}")]
    Decode(String),
    /// RSA encryption or decryption failed (oversized plaintext, wrong key, ...).
    #[error("RSA operation failed: {0}")]
    Rsa(String),
    /// AES-GCM encryption or decryption failed (auth tag mismatch, truncated
    /// ciphertext, ...).
    #[error("AES-GCM operation failed")]
    Aead,
}
