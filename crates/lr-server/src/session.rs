//! Per-connection LiveReload session.
//!
//! A [`Session`] owns one browser transport and drives the protocol state
//! machine:
//!
//! ```text
//! AwaitingHandshake ──valid hello──► Active ──transport end / close()──► Closed
//!         │                                                                ▲
//!         └──── bad hello, transport end, early request, close() ──────────┘
//! ```
//!
//! Two activities run concurrently for the lifetime of the session. The
//! receive side decodes the single client hello and afterwards only watches
//! for the peer going away. The dispatch side is the only writer: it answers
//! the hello and forwards reload/alert requests queued through a
//! [`SessionHandle`], one frame per wake-up.

use std::fmt;
use std::pin::pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{Sink, SinkExt, Stream, StreamExt};
use lr_proto::{shared_protocols, validate_hello, ClientHello, ServerMessage};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// State of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for the client hello.
    AwaitingHandshake,
    /// Handshake complete; reload and alert frames may be sent.
    Active,
    /// Terminal state.
    Closed,
}

impl SessionState {
    /// Check if reload/alert frames can be delivered.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingHandshake => write!(f, "awaiting-handshake"),
            Self::Active => write!(f, "active"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Application request queued for delivery to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    /// Reload the given path.
    Reload {
        /// Path of the changed file.
        path: String,
    },
    /// Display the given message.
    Alert {
        /// Text to display.
        message: String,
    },
}

impl SessionRequest {
    /// Turn the request into its wire frame.
    #[must_use]
    pub fn into_message(self, live_css: bool) -> ServerMessage {
        match self {
            Self::Reload { path } => ServerMessage::reload(path, live_css),
            Self::Alert { message } => ServerMessage::alert(message),
        }
    }
}

/// State shared between a session and its handles.
#[derive(Debug)]
struct SessionShared {
    id: Uuid,
    connected_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    closed: CancellationToken,
}

impl SessionShared {
    fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Move to `Active`. Only valid from `AwaitingHandshake`.
    fn activate(&self) -> bool {
        let mut state = self.state.lock();
        if *state == SessionState::AwaitingHandshake {
            *state = SessionState::Active;
            true
        } else {
            false
        }
    }

    fn close(&self) {
        *self.state.lock() = SessionState::Closed;
        self.closed.cancel();
    }
}

/// Cloneable handle used to address a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
    requests: mpsc::UnboundedSender<SessionRequest>,
}

impl SessionHandle {
    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Get when the session was created.
    #[must_use]
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.shared.connected_at
    }

    /// Get the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Check if the handshake has completed and the session is still open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Check if the session has terminated.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    /// Queue a request for the dispatch loop.
    ///
    /// Never blocks. A request that reaches a session still waiting for its
    /// handshake closes that session.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::SessionClosed`] if the session has terminated.
    pub fn request(&self, request: SessionRequest) -> ServerResult<()> {
        if self.is_closed() {
            return Err(ServerError::SessionClosed);
        }
        self.requests
            .send(request)
            .map_err(|_| ServerError::SessionClosed)
    }

    /// Ask the session to terminate. Idempotent.
    pub fn close(&self) {
        if !self.is_closed() {
            debug!(session_id = %self.shared.id, "Close requested");
        }
        self.shared.close();
    }
}

/// Outcome of one dispatch wake-up.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Send(ServerMessage),
    Close,
}

/// One LiveReload connection.
#[derive(Debug)]
pub struct Session {
    shared: Arc<SessionShared>,
    requests: mpsc::UnboundedReceiver<SessionRequest>,
    config: Arc<ServerConfig>,
}

impl Session {
    /// Create a session and the handle used to reach it.
    #[must_use]
    pub fn new(config: Arc<ServerConfig>) -> (Self, SessionHandle) {
        let shared = Arc::new(SessionShared {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
            state: Mutex::new(SessionState::AwaitingHandshake),
            closed: CancellationToken::new(),
        });
        let (tx, rx) = mpsc::unbounded_channel();

        let session = Self {
            shared: shared.clone(),
            requests: rx,
            config,
        };
        let handle = SessionHandle {
            shared,
            requests: tx,
        };
        (session, handle)
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Run the session over a transport until it closes.
    ///
    /// `inbound` yields the text of each client frame; an error or the end of
    /// the stream means the peer is gone. `outbound` receives serialized
    /// frames. Both are dropped when this returns, without a close frame.
    pub async fn run<R, W>(self, inbound: R, outbound: W)
    where
        R: Stream<Item = ServerResult<String>>,
        W: Sink<String>,
        W::Error: fmt::Display,
    {
        let Self {
            shared,
            mut requests,
            config,
        } = self;
        let id = shared.id;
        let inbound = pin!(inbound);
        let outbound = pin!(outbound);

        info!(session_id = %id, "Session started");

        let (hello_tx, hello_rx) = mpsc::channel::<ClientHello>(1);

        tokio::select! {
            result = receive(id, inbound, hello_tx) => match result {
                Ok(()) => debug!(session_id = %id, "Receive side finished"),
                Err(e @ ServerError::Protocol(_)) => {
                    warn!(session_id = %id, error = %e, "Malformed client hello, disconnecting");
                }
                Err(e) => debug!(session_id = %id, error = %e, "Transport ended"),
            },
            () = dispatch(&shared, &config, outbound, hello_rx, &mut requests) => {
                debug!(session_id = %id, "Dispatch side finished");
            }
        }

        shared.close();
        info!(
            session_id = %id,
            duration_ms = (Utc::now() - shared.connected_at).num_milliseconds(),
            "Session closed"
        );
    }
}

/// Read the client hello, then keep draining until the peer goes away.
///
/// Returns `Ok` only when the dispatch side stopped first.
async fn receive<R>(
    id: Uuid,
    mut inbound: R,
    hello_tx: mpsc::Sender<ClientHello>,
) -> ServerResult<()>
where
    R: Stream<Item = ServerResult<String>> + Unpin,
{
    let text = inbound.next().await.ok_or(ServerError::ConnectionClosed)??;
    let hello = ClientHello::from_json(&text)?;

    if hello_tx.send(hello).await.is_err() {
        return Ok(());
    }
    drop(hello_tx);

    while let Some(frame) = inbound.next().await {
        let text = frame?;
        debug!(session_id = %id, len = text.len(), "Ignoring client frame");
    }
    Err(ServerError::ConnectionClosed)
}

/// Sole writer to the transport.
async fn dispatch<W>(
    shared: &SessionShared,
    config: &ServerConfig,
    mut outbound: W,
    mut hello_rx: mpsc::Receiver<ClientHello>,
    requests: &mut mpsc::UnboundedReceiver<SessionRequest>,
) where
    W: Sink<String> + Unpin,
    W::Error: fmt::Display,
{
    let id = shared.id;

    loop {
        let step = tokio::select! {
            biased;
            () = shared.closed.cancelled() => return,
            Some(hello) = hello_rx.recv() => match on_hello(shared, config, &hello) {
                Ok(step) => step,
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Invalid handshake, disconnecting");
                    Step::Close
                }
            },
            Some(request) = requests.recv() => on_request(shared, config, request),
        };

        let message = match step {
            Step::Send(message) => message,
            Step::Close => return,
        };

        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to serialize frame");
                return;
            }
        };

        if let Err(e) = outbound.send(json).await {
            warn!(
                session_id = %id,
                command = message.command(),
                error = %e,
                "Failed to send frame"
            );
            return;
        }
        debug!(session_id = %id, command = message.command(), "Frame sent");
    }
}

fn on_hello(
    shared: &SessionShared,
    config: &ServerConfig,
    hello: &ClientHello,
) -> ServerResult<Step> {
    validate_hello(hello)?;
    if !shared.activate() {
        return Ok(Step::Close);
    }

    info!(
        session_id = %shared.id,
        protocols = ?shared_protocols(hello),
        "Handshake complete"
    );
    Ok(Step::Send(ServerMessage::hello(config.name.clone())))
}

fn on_request(shared: &SessionShared, config: &ServerConfig, request: SessionRequest) -> Step {
    match shared.state() {
        SessionState::Active => Step::Send(request.into_message(config.live_css)),
        state => {
            warn!(
                session_id = %shared.id,
                state = %state,
                request = ?request,
                "Request before handshake, disconnecting"
            );
            Step::Close
        }
    }
}
