//! The encrypted message converter: wraps the plain converter and applies
//! RSA or AES-GCM encryption to the frame body, depending on which phase of
//! the handshake is active.

use bytes::Bytes;
use qc_crypto::keypair::PublicKey;
use qc_crypto::{AsymmetricKeypair, CryptoError, SymmetricKey};

use crate::error::WireError;
use crate::frame::{self, Frame};
use crate::message::Message;
use crate::plain;

/// Something that can encrypt an outgoing frame body.
#[derive(Clone)]
pub enum Encryptor {
    /// Seal with the peer's RSA public key (used for exactly one frame: the
    /// initiator sealing the fresh symmetric key).
    Rsa(PublicKey),
    /// Seal with the established per-session symmetric key.
    Symmetric(SymmetricKey),
}

impl Encryptor {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            Encryptor::Rsa(key) => key.encrypt(plaintext),
            Encryptor::Symmetric(key) => key.encrypt(plaintext),
        }
    }
}

/// Something that can decrypt an incoming frame body.
#[derive(Clone)]
pub enum Decryptor {
    /// Open with one's own RSA private key (used while waiting for the
    /// initiator's sealed symmetric key).
    Rsa(AsymmetricKeypair),
    /// Open with the established per-session symmetric key.
    Symmetric(SymmetricKey),
}

impl Decryptor {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            Decryptor::Rsa(keys) => keys.decrypt(ciphertext),
            Decryptor::Symmetric(key) => key.decrypt(ciphertext),
        }
    }
}

/// Converts typed [`Message`]s to and from encrypted frames.
///
/// Either side may be absent: encoding falls through to plaintext when no
/// encryptor is set, decoding falls through to plaintext parsing when no
/// decryptor is set. This asymmetry is what lets the handshake's first leg
/// (the responder's public key) travel in the clear while later legs are
/// sealed.
#[derive(Clone, Default)]
pub struct Converter {
    encryptor: Option<Encryptor>,
    decryptor: Option<Decryptor>,
}

impl Converter {
    /// Build a converter from an optional encryptor and decryptor.
    pub fn new(encryptor: Option<Encryptor>, decryptor: Option<Decryptor>) -> Self {
        Self { encryptor, decryptor }
    }

    /// A converter that never encrypts or decrypts; equivalent to the plain
    /// converter but sharing this type for uniform storage in the session.
    pub fn plaintext() -> Self {
        Self::default()
    }

    /// Encode `message` into a complete framed byte string, encrypting the
    /// body if an encryptor is set.
    pub fn encode(&self, message: &Message) -> Result<Bytes, WireError> {
        let (tag, body) = plain::encode(message);
        let out_body = match &self.encryptor {
            Some(encryptor) => {
                let sealed = encryptor
                    .encrypt(&body)
                    .map_err(|e| WireError::MalformedFrame(format!("encryption failed: {e}")))?;
                Bytes::from(sealed)
            }
            None => body,
        };
        Ok(frame::encode(tag, &out_body))
    }

    /// Decode a frame into a typed [`Message`], decrypting the body first if
    /// a decryptor is set.
    pub fn decode(&self, frame: &Frame) -> Result<Message, WireError> {
        match &self.decryptor {
            Some(decryptor) => {
                let plaintext = decryptor
                    .decrypt(&frame.body)
                    .map_err(|e| WireError::MalformedFrame(format!("decryption failed: {e}")))?;
                plain::decode(&Frame { tag: frame.tag, body: Bytes::from(plaintext) })
            }
            None => plain::decode(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameDecoder;

    #[test]
    fn falls_through_to_plaintext_when_no_keys_set() {
        let converter = Converter::plaintext();
        let message = Message::UserInfo("alice".into());
        let framed = converter.encode(&message).unwrap();

        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&framed).unwrap();
        assert_eq!(converter.decode(&frames[0]).unwrap(), message);
    }

    #[test]
    fn rsa_leg_encrypts_and_decrypts() {
        let keys = AsymmetricKeypair::generate(1024).unwrap();
        let sender = Converter::new(Some(Encryptor::Rsa(keys.public_key())), None);
        let receiver = Converter::new(None, Some(Decryptor::Rsa(keys)));

        let message = Message::Key(SymmetricKey::generate().encode());
        let framed = sender.encode(&message).unwrap();

        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&framed).unwrap();
        assert_eq!(receiver.decode(&frames[0]).unwrap(), message);
    }

    #[test]
    fn symmetric_leg_encrypts_and_decrypts() {
        let key = SymmetricKey::generate();
        let converter = Converter::new(Some(Encryptor::Symmetric(key.clone())), Some(Decryptor::Symmetric(key)));

        let message = Message::NewChatMessage {
            id: crate::message::ChatMessageId::generate(),
            content: "secret".into(),
        };
        let framed = converter.encode(&message).unwrap();

        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&framed).unwrap();
        assert_eq!(converter.decode(&frames[0]).unwrap(), message);
    }

    #[test]
    fn encrypted_body_does_not_contain_plaintext() {
        let key = SymmetricKey::generate();
        let converter = Converter::new(Some(Encryptor::Symmetric(key.clone())), Some(Decryptor::Symmetric(key)));
        let message = Message::UserInfo("super-secret-name".into());
        let framed = converter.encode(&message).unwrap();
        assert!(!framed.windows(b"super-secret-name".len()).any(|w| w == b"super-secret-name"));
    }
}
