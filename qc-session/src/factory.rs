//! Owns the listening socket and mints [`ChatSession`]s for both inbound and
//! outbound connections.

use std::sync::{Arc, Mutex};

use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use qc_crypto::AsymmetricKeypair;

use crate::session::ChatSession;
use crate::transport::{Connection, Listener};
use crate::user_info::UserInfo;

/// Surfaced in place of the source's `chatRequestReceived` signal.
pub enum FactoryEvent {
    /// An inbound connection accepted. The caller decides whether to attach
    /// a [`crate::handshake::Role::Responder`] processor via
    /// [`ChatSession::initialize`], or to drop it outright.
    ChatRequestReceived {
        /// The newly constructed, not-yet-initialized session.
        session: ChatSession<TcpStream>,
        /// The session's event channel, paired with `session`.
        events: mpsc::UnboundedReceiver<crate::events::SessionEvent>,
    },
}

#[derive(Clone)]
struct Snapshot {
    user_info: UserInfo,
    keys: AsymmetricKeypair,
}

struct Listening {
    task: JoinHandle<()>,
    stop: Arc<Notify>,
}

/// Mints [`ChatSession`]s for a given identity and keypair, either by
/// listening for inbound connections or by dialing out.
///
/// Updating the identity or keypair with [`Self::set_user_info`] /
/// [`Self::set_keys`] only affects sessions constructed afterward — existing
/// sessions keep whatever snapshot they were built with, matching the
/// source's copy-by-value `UserInfo`/`KeyCombination` fields.
pub struct SessionFactory {
    state: Arc<Mutex<Snapshot>>,
    listening: Option<Listening>,
}

impl SessionFactory {
    /// Build a factory with an initial identity and keypair.
    pub fn new(user_info: UserInfo, keys: AsymmetricKeypair) -> Self {
        Self { state: Arc::new(Mutex::new(Snapshot { user_info, keys })), listening: None }
    }

    /// Replace the identity used for sessions constructed from now on.
    pub fn set_user_info(&self, user_info: UserInfo) {
        self.state.lock().unwrap().user_info = user_info;
    }

    /// Replace the keypair used for sessions constructed from now on.
    pub fn set_keys(&self, keys: AsymmetricKeypair) {
        self.state.lock().unwrap().keys = keys;
    }

    /// Start listening on `port`, surfacing each inbound connection as a
    /// [`FactoryEvent::ChatRequestReceived`] over the returned channel.
    ///
    /// Calling this again while already listening stops the previous
    /// listener first.
    pub async fn allow_connections(&mut self, port: u16) -> std::io::Result<mpsc::UnboundedReceiver<FactoryEvent>> {
        self.disallow_connections();

        let listener = Listener::bind(port).await?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let stop = Arc::new(Notify::new());
        let stop_for_task = stop.clone();
        let state = self.state.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_for_task.notified() => break,
                    accepted = listener.accept() => {
                        match accepted {
                            Ok(connection) => {
                                let snapshot = state.lock().unwrap().clone();
                                let (session, events) =
                                    ChatSession::new(connection, snapshot.user_info, snapshot.keys);
                                if events_tx.send(FactoryEvent::ChatRequestReceived { session, events }).is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(%err, "accept failed, stopping listener");
                                break;
                            }
                        }
                    }
                }
            }
        });

        self.listening = Some(Listening { task, stop });
        Ok(events_rx)
    }

    /// Stop accepting new connections. Existing sessions are unaffected.
    pub fn disallow_connections(&mut self) {
        if let Some(listening) = self.listening.take() {
            listening.stop.notify_one();
            listening.task.abort();
        }
    }

    /// Dial out to `host:port`, returning a session in the `Connected`
    /// phase (this crate's [`Connection`] always wraps an already-open
    /// stream, so `connectionEstablished` has already fired by the time
    /// this returns). The caller attaches a
    /// [`crate::handshake::Role::Initiator`] processor via
    /// [`ChatSession::initialize`].
    pub async fn try_connect(
        &self,
        host: &str,
        port: u16,
    ) -> std::io::Result<(ChatSession<TcpStream>, mpsc::UnboundedReceiver<crate::events::SessionEvent>)> {
        let connection = Connection::connect((host, port)).await?;
        let snapshot = self.state.lock().unwrap().clone();
        Ok(ChatSession::new(connection, snapshot.user_info, snapshot.keys))
    }
}

impl Drop for SessionFactory {
    fn drop(&mut self) {
        self.disallow_connections();
    }
}
