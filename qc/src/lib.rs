//! # qc — quietchat protocol core
//!
//! `qc` is a modular Rust library implementing a peer-to-peer encrypted chat
//! protocol. It consists of three focused sub-crates wired together here for
//! convenience:
//!
//! | Sub-crate    | Role                                                    |
//! |--------------|----------------------------------------------------------|
//! | `qc-crypto`  | RSA keypairs and AES-128-GCM session keys                |
//! | `qc-wire`    | Frame codec, message taxonomy, plain/encrypted converters |
//! | `qc-session` | Handshake state machine, session controller, factory      |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! # async fn run() -> std::io::Result<()> {
//! use qc::crypto::AsymmetricKeypair;
//! use qc::session::{handshake::Role, SessionFactory, UserInfo};
//!
//! let keys = AsymmetricKeypair::generate(2048).unwrap();
//! let factory = SessionFactory::new(UserInfo::new("alice"), keys);
//!
//! let (session, mut events) = factory.try_connect("127.0.0.1", 7000).await?;
//! let _handle = session.initialize(Role::Initiator);
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # A note on trust
//!
//! There is no PKI anywhere in this stack: nothing ties a received public
//! key to an identity beyond what the two endpoints already know out of
//! band. An active man-in-the-middle on first connect can substitute its
//! own key in place of the real peer's. This is a known, accepted
//! limitation of the protocol, not an oversight — see `qc_crypto`'s and
//! `qc_session`'s own crate docs for the same caveat at the layer where it
//! actually matters.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Re-export of [`qc_crypto`] — RSA keypairs, PEM encode/decode, AES-128-GCM
/// session keys.
pub use qc_crypto as crypto;

/// Re-export of [`qc_wire`] — frame codec, message taxonomy, converters.
pub use qc_wire as wire;

/// Re-export of [`qc_session`] — handshake, session controller, factory,
/// transport.
pub use qc_session as session;

// ─── Convenience re-exports ───────────────────────────────────────────────────

pub use qc_crypto::{AsymmetricKeypair, SymmetricKey};
pub use qc_session::{ChatSession, Phase, Role, SessionEvent, SessionFactory, SessionHandle, UserInfo};
pub use qc_wire::{ChatMessageId, Converter, Frame, FrameDecoder, Message};
