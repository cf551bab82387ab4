//! RSA keypair: generation, PEM encode/decode, OAEP-SHA1 encrypt/decrypt.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;

use crate::CryptoError;

/// Default RSA modulus size in bits.
///
/// The original protocol used 1024 bits for handshake speed; spec.md §4.3
/// recommends at least 2048 for new deployments, so that is the default
/// here. Callers that need the faster legacy size can pass it explicitly to
/// [`AsymmetricKeypair::generate`].
pub const DEFAULT_KEY_BITS: usize = 2048;

/// A long-lived RSA keypair: the public half encrypts, the private half
/// decrypts. One endpoint holds exactly one of these for its lifetime.
#[derive(Clone)]
pub struct AsymmetricKeypair {
    public: RsaPublicKey,
    private: RsaPrivateKey,
}

impl AsymmetricKeypair {
    /// Generate a fresh keypair of the given modulus size.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, bits).map_err(|e| CryptoError::Rsa(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        tracing::debug!(bits, "generated RSA keypair");
        Ok(Self { public, private })
    }

    /// The public half, cheap to clone and share.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.public.clone())
    }

    /// PEM-encode the public key (PKCS#8 / SPKI format).
    pub fn encode_public_pem(&self) -> Result<String, CryptoError> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Encode(e.to_string()))
    }

    /// PEM-encode the private key (PKCS#8 format). Callers are responsible
    /// for persisting this securely; this crate never writes it to disk.
    pub fn encode_private_pem(&self) -> Result<String, CryptoError> {
        self.private
            .to_pkcs8_pem(LineEnding::LF)
            .map(|z| z.to_string())
            .map_err(|e| CryptoError::Encode(e.to_string()))
    }

    /// Reconstruct a keypair from its PEM-encoded public and private halves.
    pub fn from_pem(public_pem: &str, private_pem: &str) -> Result<Self, CryptoError> {
        let public = RsaPublicKey::from_public_key_pem(public_pem)
            .map_err(|e| CryptoError::Decode(e.to_string()))?;
        let private = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .map_err(|e| CryptoError::Decode(e.to_string()))?;
        Ok(Self { public, private })
    }

    /// Decrypt a ciphertext produced by the peer's [`PublicKey::encrypt`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.private
            .decrypt(Oaep::new::<Sha1>(), ciphertext)
            .map_err(|e| CryptoError::Rsa(e.to_string()))
    }
}

/// The public half of an [`AsymmetricKeypair`], as received from a peer (or
/// cloned from one's own keypair). Can only encrypt.
#[derive(Clone)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Decode a PEM-encoded public key, as received over the wire in a `K`
    /// frame.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        RsaPublicKey::from_public_key_pem(pem)
            .map(Self)
            .map_err(|e| CryptoError::Decode(e.to_string()))
    }

    /// PEM-encode this public key, for sending in a `K` frame.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Encode(e.to_string()))
    }

    /// OAEP-SHA1-encrypt `plaintext`. Used by the initiator to seal the
    /// freshly generated symmetric key to the responder's public key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut rng = rand::thread_rng();
        self.0
            .encrypt(&mut rng, Oaep::new::<Sha1>(), plaintext)
            .map_err(|e| CryptoError::Rsa(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_pem() {
        let keys = AsymmetricKeypair::generate(1024).unwrap();
        let pub_pem = keys.encode_public_pem().unwrap();
        let priv_pem = keys.encode_private_pem().unwrap();

        let restored = AsymmetricKeypair::from_pem(&pub_pem, &priv_pem).unwrap();
        let msg = b"a short payload";
        let ct = restored.public_key().encrypt(msg).unwrap();
        let pt = restored.decrypt(&ct).unwrap();
        assert_eq!(pt, msg);
    }

    #[test]
    fn public_key_alone_can_encrypt_for_private_half() {
        let keys = AsymmetricKeypair::generate(1024).unwrap();
        let peer_pub = PublicKey::from_pem(&keys.encode_public_pem().unwrap()).unwrap();

        let ct = peer_pub.encrypt(b"symmetric-key-bytes").unwrap();
        let pt = keys.decrypt(&ct).unwrap();
        assert_eq!(pt, b"symmetric-key-bytes");
    }

    #[test]
    fn decrypt_rejects_garbage() {
        let keys = AsymmetricKeypair::generate(1024).unwrap();
        assert!(keys.decrypt(&[0u8; 16]).is_err());
    }
}
