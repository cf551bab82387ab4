//! Short-lived per-session AES-128-GCM key.
//!
//! spec.md §4.3 notes the original scheme used unauthenticated ECB, which
//! both leaks plaintext structure (identical blocks encrypt identically) and
//! provides no integrity check. This implementation upgrades to AES-128-GCM
//! while keeping the wire contract from §4.2: only the frame body is ever
//! replaced by ciphertext. The 96-bit nonce GCM requires is generated fresh
//! per call and prepended to the ciphertext, so `encode()`/`from_bytes()`
//! still round-trip the bare 128-bit key.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Key, Nonce};

use crate::CryptoError;

/// Length of the raw key in bytes (AES default key length: 128 bits).
pub const KEY_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// A symmetric key established once per session during the handshake. Never
/// persisted; lives only as long as the session does.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_LEN],
}

impl SymmetricKey {
    /// Generate a fresh key from a cryptographically strong RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self { bytes }
    }

    /// Reconstruct a key from its raw encoded bytes (as received in a `K`
    /// frame during the handshake).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::Decode(format!(
                "symmetric key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; KEY_LEN];
        out.copy_from_slice(bytes);
        Ok(Self { bytes: out })
    }

    /// Raw-encode the key, for sealing to the peer's public key.
    pub fn encode(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    fn cipher(&self) -> Aes128Gcm {
        Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&self.bytes))
    }

    /// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::Aead)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt `nonce || ciphertext || tag` produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_LEN {
            return Err(CryptoError::Aead);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher()
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::Aead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_raw_bytes() {
        let key = SymmetricKey::generate();
        let restored = SymmetricKey::from_bytes(&key.encode()).unwrap();
        let sealed = restored.encrypt(b"hello").unwrap();
        assert_eq!(key.decrypt(&sealed).unwrap(), b"hello");
    }

    #[test]
    fn two_encryptions_of_same_plaintext_differ() {
        let key = SymmetricKey::generate();
        let a = key.encrypt(b"same message").unwrap();
        let b = key.encrypt(b"same message").unwrap();
        assert_ne!(a, b, "nonce must be randomized per call");
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let key = SymmetricKey::generate();
        let mut sealed = key.encrypt(b"integrity please").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(key.decrypt(&sealed).is_err());
    }

    #[test]
    fn rejects_wrong_length_key() {
        assert!(SymmetricKey::from_bytes(&[0u8; 10]).is_err());
    }
}
