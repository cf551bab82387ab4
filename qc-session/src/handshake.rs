//! The role-specialized handshake state machine that upgrades a fresh
//! connection from plaintext to a symmetric-encrypted, identified session.
//!
//! Modeled sans-IO: [`HandshakeProcessor::handle`] takes a decoded [`Frame`]
//! and returns an [`Emission`] describing what to send (if anything) and
//! whether the handshake has finished, rather than writing to a transport
//! itself. This mirrors the step-function shape of
//! `layer_mtproto::authentication`, generalized from a fixed linear sequence
//! to a table indexed by `(role, phase, incoming variant)` since the two
//! roles here play genuinely different parts rather than taking turns in a
//! shared sequence.

use bytes::Bytes;
use qc_crypto::keypair::PublicKey;
use qc_crypto::{AsymmetricKeypair, SymmetricKey};
use qc_wire::{Converter, Decryptor, Encryptor, Frame, Message};

use crate::error::HandshakeError;
use crate::user_info::UserInfo;

/// Which side of the handshake a processor is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Dialed the connection. Waits for the responder's public key, then
    /// seals a fresh symmetric key to it.
    Initiator,
    /// Accepted the connection. Sends its public key first, unauthenticated.
    Responder,
}

/// What a processor step produces.
pub enum Emission {
    /// Nothing to send yet (the initiator's passive start).
    None,
    /// Send this complete frame over the transport; the handshake continues.
    Send(Bytes),
    /// Send this complete frame, then the handshake is finished.
    SendAndFinish {
        /// The frame to send before handing control to the data phase.
        frame: Bytes,
        /// The converter the session should adopt from here on.
        converter: Converter,
        /// The peer's announced identity.
        peer: UserInfo,
    },
    /// The handshake is finished with nothing further to send.
    Finished {
        /// The converter the session should adopt from here on.
        converter: Converter,
        /// The peer's announced identity.
        peer: UserInfo,
    },
}

/// A role-specific handshake state machine.
///
/// State mirrors the original one-to-one: `public_key_received`, `finished`,
/// the active `converter`, plus the owned keypair and identity needed to
/// answer each step.
pub struct HandshakeProcessor {
    role: Role,
    own_keys: AsymmetricKeypair,
    own_user_info: UserInfo,
    public_key_received: bool,
    finished: bool,
    converter: Converter,
}

impl HandshakeProcessor {
    /// Build a processor for the given role. Call [`Self::start`] before
    /// feeding it any frames.
    pub fn new(role: Role, own_keys: AsymmetricKeypair, own_user_info: UserInfo) -> Self {
        Self {
            role,
            own_keys,
            own_user_info,
            public_key_received: false,
            finished: false,
            converter: Converter::plaintext(),
        }
    }

    /// Which role this processor is playing.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the handshake has finished, successfully or otherwise. No
    /// further frames should be fed to [`Self::handle`] afterward.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drive the handshake's first move. The responder emits its public key
    /// in the clear; the initiator has nothing to send until it hears from
    /// the responder.
    pub fn start(&mut self) -> Result<Emission, HandshakeError> {
        match self.role {
            Role::Responder => {
                self.converter = Converter::new(None, Some(Decryptor::Rsa(self.own_keys.clone())));
                let pem = self.own_keys.encode_public_pem()?;
                let frame = self.converter.encode(&Message::Key(pem.into_bytes()))?;
                tracing::debug!("responder sent public key");
                Ok(Emission::Send(frame))
            }
            Role::Initiator => Ok(Emission::None),
        }
    }

    /// Feed one decoded frame into the processor, using its own converter to
    /// decrypt the body.
    pub fn handle(&mut self, frame: &Frame) -> Result<Emission, HandshakeError> {
        if self.finished {
            return Err(HandshakeError::AlreadyFinished);
        }

        let message = self.converter.decode(frame)?;

        match message {
            Message::SessionEnd => {
                self.finished = true;
                Err(HandshakeError::HandshakeTerminated)
            }
            Message::NewChatMessage { .. } | Message::EditChatMessage { .. } => {
                Err(HandshakeError::MalformedFrame("chat traffic received during handshake".into()))
            }
            Message::Key(body) => self.handle_key(body),
            Message::UserInfo(username) => self.handle_user_info(username),
        }
    }

    fn handle_key(&mut self, body: Vec<u8>) -> Result<Emission, HandshakeError> {
        match self.role {
            Role::Responder => {
                // spec.md's responder transition table has no duplicate-key
                // guard, unlike the initiator's; a second Key here simply
                // re-keys the session rather than erroring.
                let sym_key = SymmetricKey::from_bytes(&body)?;
                self.converter =
                    Converter::new(Some(Encryptor::Symmetric(sym_key.clone())), Some(Decryptor::Symmetric(sym_key)));
                self.public_key_received = true;
                let frame = self.converter.encode(&Message::UserInfo(self.own_user_info.as_str().to_owned()))?;
                tracing::debug!("responder installed symmetric key, sent UserInfo");
                Ok(Emission::Send(frame))
            }
            Role::Initiator => {
                if self.public_key_received {
                    self.finished = true;
                    return Err(HandshakeError::DuplicateKey);
                }
                let peer_public = PublicKey::from_pem(std::str::from_utf8(&body).map_err(|e| {
                    HandshakeError::MalformedFrame(format!("public key PEM is not valid UTF-8: {e}"))
                })?)?;
                let sym_key = SymmetricKey::generate();
                let sealing = Converter::new(
                    Some(Encryptor::Rsa(peer_public)),
                    Some(Decryptor::Rsa(self.own_keys.clone())),
                );
                let frame = sealing.encode(&Message::Key(sym_key.encode()))?;
                self.converter =
                    Converter::new(Some(Encryptor::Symmetric(sym_key.clone())), Some(Decryptor::Symmetric(sym_key)));
                self.public_key_received = true;
                tracing::debug!("initiator sealed fresh symmetric key to responder's public key");
                Ok(Emission::Send(frame))
            }
        }
    }

    fn handle_user_info(&mut self, username: String) -> Result<Emission, HandshakeError> {
        let peer = UserInfo::new(username);
        match self.role {
            Role::Responder => {
                if !self.public_key_received {
                    return Err(HandshakeError::DataBeforeKey);
                }
                self.finished = true;
                tracing::debug!(peer = %peer, "responder finished handshake");
                Ok(Emission::Finished { converter: self.converter.clone(), peer })
            }
            Role::Initiator => {
                let frame = self.converter.encode(&Message::UserInfo(self.own_user_info.as_str().to_owned()))?;
                self.finished = true;
                tracing::debug!(peer = %peer, "initiator finished handshake");
                Ok(Emission::SendAndFinish { frame, converter: self.converter.clone(), peer })
            }
        }
    }

    /// Emit a `SessionEnd` frame through whatever converter is currently
    /// active and mark the processor finished. The caller must not feed it
    /// any further frames afterward.
    pub fn end(&mut self) -> Result<Bytes, HandshakeError> {
        let frame = self.converter.encode(&Message::SessionEnd)?;
        self.finished = true;
        Ok(frame)
    }
}
