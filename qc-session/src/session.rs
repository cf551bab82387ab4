//! The per-connection session controller: binds a handshake processor to a
//! connection, then replaces it with the data-phase dispatcher once the
//! handshake finishes.
//!
//! Concurrency model: each session runs its own `tokio::task`. Every inbound
//! frame and every command from [`SessionHandle`] is handled as one
//! non-preemptible step inside that task's loop, so there is never a
//! partially-processed frame interleaved with another command — the
//! single-executor requirement from the source's event-driven model, here
//! satisfied by giving each session its own task instead of its own thread.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use qc_crypto::AsymmetricKeypair;
use qc_wire::{Converter, Message};

use crate::error::SessionError;
use crate::events::{HandshakeFailure, SessionEvent};
use crate::handshake::{Emission, HandshakeProcessor, Role};
use crate::transport::Connection;
use crate::user_info::UserInfo;

/// The session's monotonic lifecycle. Never goes backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Connection not yet confirmed open. Not currently reachable from
    /// [`ChatSession::new`], which only accepts already-open connections,
    /// but kept as a distinct variant so the phase sequence matches
    /// spec.md's `Constructed → Connected → Initialized → Ended` exactly.
    Constructed,
    /// Connection open; no handshake processor attached yet, or one is
    /// attached and running.
    Connected,
    /// Handshake finished; the data-phase dispatcher is active.
    Initialized,
    /// Session torn down, by either side.
    Ended,
}

enum Stage {
    Handshaking(HandshakeProcessor),
    DataPhase { converter: Converter, peer: UserInfo },
}

enum Command {
    Send(Message),
    End,
}

/// A lightweight handle to a running session's actor task.
///
/// Cloning is cheap; every clone can independently send commands. Dropping
/// every handle does not end the session — only an explicit [`Self::end`]
/// does.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Serialize `message` through the session's active converter and write
    /// it to the transport. A no-op before the handshake finishes or after
    /// [`Self::end`].
    pub fn send_message(&self, message: Message) {
        let _ = self.commands.send(Command::Send(message));
    }

    /// End the session. Idempotent: sending this more than once, or after
    /// the session has already ended on its own, has no further effect.
    pub fn end(&self) {
        let _ = self.commands.send(Command::End);
    }
}

/// A session bound to one connection, not yet handed a handshake processor.
pub struct ChatSession<S> {
    connection: Connection<S>,
    own_user_info: UserInfo,
    own_keys: AsymmetricKeypair,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<S> ChatSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Construct a session over an already-open connection. Emits
    /// [`SessionEvent::ConnectionEstablished`] immediately, since this
    /// crate's [`Connection`] only ever wraps a stream that has already
    /// completed its connect/accept.
    pub fn new(
        connection: Connection<S>,
        own_user_info: UserInfo,
        own_keys: AsymmetricKeypair,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let _ = events.send(SessionEvent::ConnectionEstablished);
        (Self { connection, own_user_info, own_keys, events }, rx)
    }

    /// Attach a handshake processor for the given role and start the
    /// session's event loop on its own task.
    pub fn initialize(self, role: Role) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(self, role, commands_rx));
        SessionHandle { commands: commands_tx }
    }
}

async fn run<S>(session: ChatSession<S>, role: Role, mut commands: mpsc::UnboundedReceiver<Command>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let ChatSession { mut connection, own_user_info, own_keys, events } = session;
    let mut processor = HandshakeProcessor::new(role, own_keys, own_user_info);
    let mut phase = Phase::Connected;

    match processor.start() {
        Ok(Emission::Send(frame)) => {
            if connection.send(frame).await.is_err() {
                let _ = events.send(SessionEvent::SessionInitializationError(HandshakeFailure::Disconnected));
                return;
            }
        }
        Ok(Emission::None) => {}
        Ok(Emission::SendAndFinish { .. } | Emission::Finished { .. }) => {
            unreachable!("start() never finishes the handshake on its own")
        }
        Err(err) => {
            let _ = events.send(SessionEvent::SessionInitializationError(HandshakeFailure::Protocol(err)));
            return;
        }
    }

    let mut stage = Stage::Handshaking(processor);

    loop {
        tokio::select! {
            frame = connection.recv_frame() => {
                match frame {
                    Ok(Some(frame)) => {
                        if !step_on_frame(&mut stage, &mut phase, &mut connection, &events, frame).await {
                            break;
                        }
                    }
                    Ok(None) => {
                        on_disconnect(&mut phase, &stage, &events);
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(%err, "frame codec error, closing transport");
                        let _ = events.send(SessionEvent::InvalidMessageReceived(SessionError::from(err)));
                        break;
                    }
                }
            }
            command = commands.recv() => {
                match command {
                    Some(Command::Send(message)) => send_message(&stage, &mut connection, message).await,
                    Some(Command::End) | None => {
                        end_session(&mut stage, &mut phase, &mut connection).await;
                        break;
                    }
                }
            }
        }

        if phase == Phase::Ended {
            break;
        }
    }
}

/// Returns `false` if the session loop should stop after this step.
///
/// Splits into two passes to sidestep a self-referential borrow: the
/// handshake processor's `handle()` call returns a fully owned [`Emission`],
/// so its borrow of `stage` ends before `stage` is reassigned to
/// `Stage::DataPhase` below, rather than trying to do both inside one match
/// arm.
async fn step_on_frame<S>(
    stage: &mut Stage,
    phase: &mut Phase,
    connection: &mut Connection<S>,
    events: &mpsc::UnboundedSender<SessionEvent>,
    frame: qc_wire::Frame,
) -> bool
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Stage::DataPhase { converter, peer } = stage {
        return dispatch_data(converter, peer, phase, events, &frame);
    }

    let Stage::Handshaking(processor) = stage else { unreachable!("DataPhase handled above") };
    let emission = processor.handle(&frame);

    match emission {
        Ok(Emission::None) => true,
        Ok(Emission::Send(out)) => connection.send(out).await.is_ok(),
        Ok(Emission::SendAndFinish { frame: out, converter, peer }) => {
            if connection.send(out).await.is_err() {
                let _ = events.send(SessionEvent::SessionInitializationError(HandshakeFailure::Disconnected));
                return false;
            }
            finish(stage, phase, events, converter, peer);
            true
        }
        Ok(Emission::Finished { converter, peer }) => {
            finish(stage, phase, events, converter, peer);
            true
        }
        Err(err) => {
            tracing::warn!(%err, "handshake failed");
            let _ = events.send(SessionEvent::SessionInitializationError(HandshakeFailure::Protocol(err)));
            false
        }
    }
}

fn finish(stage: &mut Stage, phase: &mut Phase, events: &mpsc::UnboundedSender<SessionEvent>, converter: Converter, peer: UserInfo) {
    tracing::info!(peer = %peer, "session initialized");
    *phase = Phase::Initialized;
    let peer_for_event = peer.clone();
    *stage = Stage::DataPhase { converter, peer };
    let _ = events.send(SessionEvent::SessionInitialized { peer: peer_for_event });
}

fn dispatch_data(
    converter: &Converter,
    peer: &mut UserInfo,
    phase: &mut Phase,
    events: &mpsc::UnboundedSender<SessionEvent>,
    frame: &qc_wire::Frame,
) -> bool {
    let message = match converter.decode(frame) {
        Ok(m) => m,
        Err(err) => {
            let _ = events.send(SessionEvent::InvalidMessageReceived(SessionError::from(err)));
            return true;
        }
    };

    match message {
        Message::Key(_) => {
            let _ = events.send(SessionEvent::InvalidMessageReceived(SessionError::DuplicateKey));
        }
        Message::UserInfo(username) => {
            *peer = UserInfo::new(username);
        }
        Message::SessionEnd => {
            *phase = Phase::Ended;
            let _ = events.send(SessionEvent::SessionEndedByOtherSide);
            return false;
        }
        Message::NewChatMessage { id, content } => {
            let _ = events.send(SessionEvent::NewChatMessageReceived { id, content });
        }
        Message::EditChatMessage { id, content } => {
            let _ = events.send(SessionEvent::EditedChatMessageReceived { id, content });
        }
    }
    true
}

async fn send_message<S>(stage: &Stage, connection: &mut Connection<S>, message: Message)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Stage::DataPhase { converter, .. } = stage {
        if let Ok(frame) = converter.encode(&message) {
            let _ = connection.send(frame).await;
        }
    }
}

async fn end_session<S>(stage: &mut Stage, phase: &mut Phase, connection: &mut Connection<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if *phase == Phase::Ended {
        return;
    }
    let frame: Option<Bytes> = match stage {
        Stage::DataPhase { converter, .. } => converter.encode(&Message::SessionEnd).ok(),
        Stage::Handshaking(processor) => processor.end().ok(),
    };
    if let Some(frame) = frame {
        let _ = connection.send(frame).await;
    }
    *phase = Phase::Ended;
}

fn on_disconnect(phase: &mut Phase, stage: &Stage, events: &mpsc::UnboundedSender<SessionEvent>) {
    let was_initialized = matches!(stage, Stage::DataPhase { .. });
    *phase = Phase::Ended;
    if was_initialized {
        let _ = events.send(SessionEvent::SessionEndedByOtherSide);
    } else {
        let _ = events.send(SessionEvent::SessionInitializationError(HandshakeFailure::Disconnected));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::duplex_pair;
    use qc_crypto::AsymmetricKeypair;

    async fn recv_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        rx.recv().await.expect("channel closed before expected event")
    }

    #[tokio::test]
    async fn successful_handshake_then_chat_round_trip() {
        let (r_conn, i_conn) = duplex_pair(64 * 1024);

        let (r_session, mut r_events) =
            ChatSession::new(r_conn, UserInfo::new("alice"), AsymmetricKeypair::generate(1024).unwrap());
        let (i_session, mut i_events) =
            ChatSession::new(i_conn, UserInfo::new("bob"), AsymmetricKeypair::generate(1024).unwrap());

        assert!(matches!(recv_event(&mut r_events).await, SessionEvent::ConnectionEstablished));
        assert!(matches!(recv_event(&mut i_events).await, SessionEvent::ConnectionEstablished));

        let responder = r_session.initialize(Role::Responder);
        let initiator = i_session.initialize(Role::Initiator);

        match recv_event(&mut r_events).await {
            SessionEvent::SessionInitialized { peer } => assert_eq!(peer.as_str(), "bob"),
            other => panic!("expected SessionInitialized, got {other:?}"),
        }
        match recv_event(&mut i_events).await {
            SessionEvent::SessionInitialized { peer } => assert_eq!(peer.as_str(), "alice"),
            other => panic!("expected SessionInitialized, got {other:?}"),
        }

        let id = qc_wire::ChatMessageId::generate();
        initiator.send_message(Message::NewChatMessage { id, content: "hi".into() });
        match recv_event(&mut r_events).await {
            SessionEvent::NewChatMessageReceived { id: got_id, content } => {
                assert_eq!(got_id, id);
                assert_eq!(content, "hi");
            }
            other => panic!("expected NewChatMessageReceived, got {other:?}"),
        }

        initiator.send_message(Message::EditChatMessage { id, content: "hello".into() });
        match recv_event(&mut r_events).await {
            SessionEvent::EditedChatMessageReceived { id: got_id, content } => {
                assert_eq!(got_id, id);
                assert_eq!(content, "hello");
            }
            other => panic!("expected EditedChatMessageReceived, got {other:?}"),
        }

        initiator.end();
        assert!(matches!(recv_event(&mut r_events).await, SessionEvent::SessionEndedByOtherSide));
    }

    #[tokio::test]
    async fn peer_disconnect_during_handshake_fails_initialization() {
        let (r_conn, i_conn) = duplex_pair(64 * 1024);

        let (r_session, mut r_events) =
            ChatSession::new(r_conn, UserInfo::new("alice"), AsymmetricKeypair::generate(1024).unwrap());
        let _ = ChatSession::new(i_conn, UserInfo::new("bob"), AsymmetricKeypair::generate(1024).unwrap());
        // i_conn (and its ChatSession) drop here without ever being initialized,
        // closing the duplex stream from the initiator's side.

        assert!(matches!(recv_event(&mut r_events).await, SessionEvent::ConnectionEstablished));
        let _responder = r_session.initialize(Role::Responder);

        match recv_event(&mut r_events).await {
            SessionEvent::SessionInitializationError(HandshakeFailure::Disconnected) => {}
            other => panic!("expected SessionInitializationError(Disconnected), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_key_after_handshake_is_reported_without_tearing_down() {
        let (r_conn, i_conn) = duplex_pair(64 * 1024);

        let (r_session, mut r_events) =
            ChatSession::new(r_conn, UserInfo::new("alice"), AsymmetricKeypair::generate(1024).unwrap());
        let (i_session, mut i_events) =
            ChatSession::new(i_conn, UserInfo::new("bob"), AsymmetricKeypair::generate(1024).unwrap());
        recv_event(&mut r_events).await;
        recv_event(&mut i_events).await;

        let responder = r_session.initialize(Role::Responder);
        let initiator = i_session.initialize(Role::Initiator);
        recv_event(&mut r_events).await;
        recv_event(&mut i_events).await;

        initiator.send_message(Message::Key(b"not-allowed-anymore".to_vec()));
        match recv_event(&mut r_events).await {
            SessionEvent::InvalidMessageReceived(SessionError::DuplicateKey) => {}
            other => panic!("expected InvalidMessageReceived(DuplicateKey), got {other:?}"),
        }

        // Session must still be alive — an unrelated chat message still goes through.
        let id = qc_wire::ChatMessageId::generate();
        initiator.send_message(Message::NewChatMessage { id, content: "still alive".into() });
        match recv_event(&mut r_events).await {
            SessionEvent::NewChatMessageReceived { content, .. } => assert_eq!(content, "still alive"),
            other => panic!("expected NewChatMessageReceived, got {other:?}"),
        }

        let _ = responder;
    }
}
