//! End-to-end scenarios driving two in-memory duplex transports wired
//! together, with no real sockets involved.

use qc_crypto::AsymmetricKeypair;
use qc_session::handshake::Role;
use qc_session::transport::duplex_pair;
use qc_session::{ChatSession, SessionEvent, UserInfo};
use qc_wire::Message;

async fn next_event(rx: &mut tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
    rx.recv().await.expect("session task dropped its event sender")
}

#[tokio::test]
async fn successful_handshake_establishes_matching_peers_on_both_sides() {
    let (responder_conn, initiator_conn) = duplex_pair(64 * 1024);

    let (responder_session, mut responder_events) =
        ChatSession::new(responder_conn, UserInfo::new("alice"), AsymmetricKeypair::generate(1024).unwrap());
    let (initiator_session, mut initiator_events) =
        ChatSession::new(initiator_conn, UserInfo::new("bob"), AsymmetricKeypair::generate(1024).unwrap());

    assert!(matches!(next_event(&mut responder_events).await, SessionEvent::ConnectionEstablished));
    assert!(matches!(next_event(&mut initiator_events).await, SessionEvent::ConnectionEstablished));

    let responder = responder_session.initialize(Role::Responder);
    let initiator = initiator_session.initialize(Role::Initiator);

    match next_event(&mut responder_events).await {
        SessionEvent::SessionInitialized { peer } => assert_eq!(peer.as_str(), "bob"),
        other => panic!("unexpected event: {other:?}"),
    }
    match next_event(&mut initiator_events).await {
        SessionEvent::SessionInitialized { peer } => assert_eq!(peer.as_str(), "alice"),
        other => panic!("unexpected event: {other:?}"),
    }

    let id = qc_wire::ChatMessageId::generate();
    initiator.send_message(Message::NewChatMessage { id, content: "hi".into() });
    match next_event(&mut responder_events).await {
        SessionEvent::NewChatMessageReceived { id: got, content } => {
            assert_eq!(got, id);
            assert_eq!(content, "hi");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    initiator.send_message(Message::EditChatMessage { id, content: "hello".into() });
    match next_event(&mut responder_events).await {
        SessionEvent::EditedChatMessageReceived { id: got, content } => {
            assert_eq!(got, id);
            assert_eq!(content, "hello");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    responder.end();
    assert!(matches!(next_event(&mut initiator_events).await, SessionEvent::SessionEndedByOtherSide));
}

#[tokio::test]
async fn peer_closing_transport_mid_handshake_reports_initialization_error() {
    let (responder_conn, initiator_conn) = duplex_pair(64 * 1024);

    let (responder_session, mut responder_events) =
        ChatSession::new(responder_conn, UserInfo::new("alice"), AsymmetricKeypair::generate(1024).unwrap());
    let (_initiator_session, _initiator_events) =
        ChatSession::new(initiator_conn, UserInfo::new("bob"), AsymmetricKeypair::generate(1024).unwrap());
    // _initiator_session is dropped here, without ever calling initialize(),
    // which closes its half of the duplex stream before any Key message
    // arrives back at the responder.

    assert!(matches!(next_event(&mut responder_events).await, SessionEvent::ConnectionEstablished));
    let _responder = responder_session.initialize(Role::Responder);

    match next_event(&mut responder_events).await {
        SessionEvent::SessionInitializationError(_) => {}
        other => panic!("expected SessionInitializationError, got {other:?}"),
    }
}
