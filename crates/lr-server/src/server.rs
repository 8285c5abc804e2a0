//! LiveReload server: listener lifecycle and session ownership.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::{Sink, Stream};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::routes::listener_router;
use crate::session::{Session, SessionHandle, SessionRequest};

/// Bookkeeping for a listener while the server is accepting connections.
#[derive(Debug, Clone)]
struct ListenerState {
    id: Uuid,
    local_addr: SocketAddr,
    /// Drops the listener immediately.
    abort: CancellationToken,
    /// Stops accepting and lets in-flight requests finish.
    graceful: CancellationToken,
}

impl ListenerState {
    fn new(local_addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            local_addr,
            abort: CancellationToken::new(),
            graceful: CancellationToken::new(),
        }
    }
}

#[derive(Debug)]
struct ServerInner {
    config: Arc<ServerConfig>,
    /// The one session reachable through `reload`/`alert`.
    current: RwLock<Option<SessionHandle>>,
    listener: Mutex<Option<ListenerState>>,
}

/// LiveReload server.
///
/// Cheap to clone; clones share the same listener and session. All public
/// methods except [`serve`](Self::serve) and
/// [`listen_and_serve`](Self::listen_and_serve) are synchronous and safe to
/// call from any thread.
#[derive(Debug, Clone)]
pub struct LiveReloadServer {
    inner: Arc<ServerInner>,
}

impl LiveReloadServer {
    /// Create a new server with the given configuration.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                config: Arc::new(config),
                current: RwLock::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the name sent to browsers.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Whether reload frames allow in-place stylesheet swaps.
    #[must_use]
    pub fn live_css(&self) -> bool {
        self.inner.config.live_css
    }

    /// Address the server is accepting on, if listening.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.listener.lock().as_ref().map(|l| l.local_addr)
    }

    /// Check if the server is accepting connections.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.listener.lock().is_some()
    }

    /// Check if a browser is connected and past its handshake.
    ///
    /// Advisory only: the answer may be stale by the time it is read.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.active_session().is_some()
    }

    /// Bind the configured address and serve until closed.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the server is already listening.
    pub async fn listen_and_serve(&self) -> ServerResult<()> {
        let addr = self.inner.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is already listening or the listener
    /// has no local address.
    pub async fn serve(&self, listener: TcpListener) -> ServerResult<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        let state = ListenerState::new(local_addr);

        {
            let mut current = self.inner.listener.lock();
            if let Some(existing) = current.as_ref() {
                return Err(ServerError::AlreadyListening(existing.local_addr));
            }
            *current = Some(state.clone());
        }

        info!(addr = %local_addr, name = %self.name(), "LiveReload server listening");

        let router = listener_router(self.clone(), state.id);
        let graceful = state.graceful.clone();
        let serve = async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(graceful.cancelled_owned())
                .await
        };

        let result = tokio::select! {
            result = serve => result.map_err(|e| ServerError::Internal(e.to_string())),
            () = state.abort.cancelled() => Ok(()),
        };

        {
            let mut current = self.inner.listener.lock();
            if current.as_ref().is_some_and(|l| l.id == state.id) {
                *current = None;
            }
        }

        info!(addr = %local_addr, "LiveReload server stopped");
        result
    }

    /// Stop the server abruptly.
    ///
    /// The listener is dropped without waiting for in-flight requests and the
    /// connected browser, if any, is disconnected. Connections accepted before
    /// the stop can no longer open a session.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotStarted`] if the server is not listening.
    pub fn close(&self) -> ServerResult<()> {
        let state = self.take_listener("close")?;
        info!(addr = %state.local_addr, "Stopping server");
        state.abort.cancel();
        self.close_session();
        Ok(())
    }

    /// Stop the server gracefully.
    ///
    /// New connections are refused while in-flight HTTP requests complete.
    /// The connected browser, if any, is disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotStarted`] if the server is not listening.
    pub fn shutdown(&self) -> ServerResult<()> {
        let state = self.take_listener("shutdown")?;
        info!(addr = %state.local_addr, "Shutting down server");
        state.graceful.cancel();
        self.close_session();
        Ok(())
    }

    /// Ask the connected browser to reload `path`.
    ///
    /// A no-op (logged) when no browser has completed its handshake.
    pub fn reload(&self, path: impl Into<String>) {
        let path = path.into();
        info!(path = %path, "Requesting reload");
        self.send(SessionRequest::Reload { path });
    }

    /// Ask the connected browser to display `message`.
    ///
    /// A no-op (logged) when no browser has completed its handshake.
    pub fn alert(&self, message: impl Into<String>) {
        let message = message.into();
        info!(message = %message, "Requesting alert");
        self.send(SessionRequest::Alert { message });
    }

    /// Install a session for a freshly upgraded transport and run it.
    ///
    /// Replaces any previously installed session; the old one keeps running
    /// on its own transport but is no longer addressable. When `listener` is
    /// set, the transport is dropped unless that listener is still the one
    /// accepting.
    pub(crate) async fn attach<R, W>(&self, listener: Option<Uuid>, inbound: R, outbound: W)
    where
        R: Stream<Item = ServerResult<String>>,
        W: Sink<String>,
        W::Error: fmt::Display,
    {
        let (session, handle) = Session::new(self.inner.config.clone());
        let id = handle.id();

        {
            let accepting = self.inner.listener.lock();
            if let Some(listener) = listener {
                if accepting.as_ref().is_none_or(|l| l.id != listener) {
                    warn!(
                        session_id = %id,
                        listener = %listener,
                        "Listener stopped, dropping connection"
                    );
                    return;
                }
            }

            let previous = self.inner.current.write().replace(handle);
            if let Some(previous) = previous {
                debug!(previous = %previous.id(), session_id = %id, "Replacing installed session");
            }
        }

        session.run(inbound, outbound).await;
        self.detach(id);
    }

    /// Clear the installed session if it is still `id`.
    fn detach(&self, id: Uuid) {
        let mut current = self.inner.current.write();
        if current.as_ref().is_some_and(|h| h.id() == id) {
            *current = None;
            debug!(session_id = %id, "Session detached");
        }
    }

    fn active_session(&self) -> Option<SessionHandle> {
        self.inner
            .current
            .read()
            .as_ref()
            .filter(|h| h.is_active())
            .cloned()
    }

    fn send(&self, request: SessionRequest) {
        let Some(session) = self.active_session() else {
            warn!(request = ?request, "No connected client, request dropped");
            return;
        };
        if let Err(e) = session.request(request) {
            warn!(session_id = %session.id(), error = %e, "Failed to queue request");
        }
    }

    fn close_session(&self) {
        let session = self.inner.current.write().take();
        if let Some(session) = session {
            session.close();
        }
    }

    fn take_listener(&self, op: &str) -> ServerResult<ListenerState> {
        self.inner.listener.lock().take().ok_or_else(|| {
            warn!(op, "Called before server started");
            ServerError::NotStarted
        })
    }
}
