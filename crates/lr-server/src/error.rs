//! Error types for the LiveReload server.

use std::net::SocketAddr;

use lr_proto::ProtoError;
use thiserror::Error;

/// Errors that can occur in the LiveReload server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    /// The server is already accepting connections.
    #[error("server is already listening on {0}")]
    AlreadyListening(SocketAddr),

    /// Close or shutdown was requested before the server started.
    #[error("server has not been started")]
    NotStarted,

    /// WebSocket transport error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// A binary frame did not hold UTF-8 text.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The client broke the protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),

    /// The session can no longer accept requests.
    #[error("session closed")]
    SessionClosed,

    /// The peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
