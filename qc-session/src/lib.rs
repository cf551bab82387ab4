//! Handshake state machine, session controller, and session factory for the
//! quietchat protocol.
//!
//! Wires together [`qc_crypto`]'s key material and [`qc_wire`]'s frame codec
//! into the full connection lifecycle: a [`handshake::HandshakeProcessor`]
//! upgrades a fresh connection from plaintext to a symmetric-encrypted,
//! identified [`session::ChatSession`], and a [`factory::SessionFactory`]
//! mints sessions for both inbound and outbound connections.
//!
//! # A note on trust
//!
//! There is no PKI here: nothing ties a received public key to an identity
//! beyond what the two endpoints already know out of band. An active
//! man-in-the-middle on first connect can substitute its own key. This
//! mirrors the upstream protocol and is not addressed at this layer.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod handshake;
pub mod session;
pub mod transport;
pub mod user_info;

pub use config::Config;
pub use error::{HandshakeError, SessionError};
pub use events::{HandshakeFailure, SessionEvent};
pub use factory::{FactoryEvent, SessionFactory};
pub use handshake::{Emission, HandshakeProcessor, Role};
pub use session::{ChatSession, Phase, SessionHandle};
pub use transport::{duplex_pair, Connection, Listener};
pub use user_info::UserInfo;
