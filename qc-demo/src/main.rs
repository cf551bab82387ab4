//! Two quietchat peers handshake and exchange messages over a real TCP
//! socket on loopback.
//!
//! # What this does
//!
//! 1. One task binds a [`qc_session::SessionFactory`] on `127.0.0.1` and
//!    waits for a single inbound connection (the responder).
//! 2. A second task dials that port with its own factory (the initiator).
//! 3. Both sides attach a handshake processor via
//!    [`qc_session::ChatSession::initialize`] and print each
//!    [`qc_session::SessionEvent`] as it arrives.
//! 4. Once `SessionInitialized` fires on both sides, the initiator sends a
//!    chat message, edits it, then ends the session.
//!
//! # Run
//! ```
//! cargo run -p qc-demo
//! ```

use qc::AsymmetricKeypair;
use qc_session::handshake::Role;
use qc_session::{FactoryEvent, SessionEvent, SessionFactory, UserInfo};
use qc_wire::{ChatMessageId, Message};

const PORT: u16 = 17862;

async fn run_responder(mut factory: SessionFactory) {
    let mut requests = factory.allow_connections(PORT).await.expect("bind responder socket");
    println!("[alice] listening on 127.0.0.1:{PORT} …");

    let FactoryEvent::ChatRequestReceived { session, mut events } =
        requests.recv().await.expect("initiator never connected");
    println!("[alice] ✓ inbound connection accepted");

    let _handle = session.initialize(Role::Responder);
    drive_events("alice", &mut events).await;
}

async fn run_initiator(factory: SessionFactory) {
    println!("[bob]   connecting to 127.0.0.1:{PORT} …");
    let (session, mut events) =
        factory.try_connect("127.0.0.1", PORT).await.expect("connect to responder");
    println!("[bob]   ✓ TCP connected");

    let handle = session.initialize(Role::Initiator);

    // Wait for the handshake to finish before sending anything.
    loop {
        match events.recv().await.expect("session task dropped its event sender") {
            SessionEvent::SessionInitialized { peer } => {
                println!("[bob]   ✓ handshake complete, peer is {peer}");
                break;
            }
            other => print_event("bob", &other),
        }
    }

    let id = ChatMessageId::generate();
    println!("[bob]   → NewChatMessage({id}, \"hello, alice\")");
    handle.send_message(Message::NewChatMessage { id, content: "hello, alice".into() });

    println!("[bob]   → EditChatMessage({id}, \"hello, alice!\")");
    handle.send_message(Message::EditChatMessage { id, content: "hello, alice!".into() });

    println!("[bob]   → SessionEnd");
    handle.end();

    drive_events("bob", &mut events).await;
}

async fn drive_events(who: &str, events: &mut tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        let ended = matches!(event, SessionEvent::SessionEndedByOtherSide);
        print_event(who, &event);
        if ended {
            break;
        }
    }
}

fn print_event(who: &str, event: &SessionEvent) {
    println!("[{who}] {event:?}");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let alice_keys = AsymmetricKeypair::generate(2048).expect("generate alice's keypair");
    let bob_keys = AsymmetricKeypair::generate(2048).expect("generate bob's keypair");

    let alice_factory = SessionFactory::new(UserInfo::new("alice"), alice_keys);
    let bob_factory = SessionFactory::new(UserInfo::new("bob"), bob_keys);

    let responder = tokio::spawn(run_responder(alice_factory));
    // Give the listener a moment to bind before the initiator dials in.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let initiator = tokio::spawn(run_initiator(bob_factory));

    let _ = tokio::join!(responder, initiator);
    println!("\n✓ demo complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_demo_round_trip_completes() {
        let alice_keys = AsymmetricKeypair::generate(1024).unwrap();
        let bob_keys = AsymmetricKeypair::generate(1024).unwrap();
        let alice_factory = SessionFactory::new(UserInfo::new("alice"), alice_keys);
        let bob_factory = SessionFactory::new(UserInfo::new("bob"), bob_keys);

        let responder = tokio::spawn(run_responder(alice_factory));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let initiator = tokio::spawn(run_initiator(bob_factory));

        let (r, i) = tokio::join!(responder, initiator);
        r.unwrap();
        i.unwrap();
    }
}
