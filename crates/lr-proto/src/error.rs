//! Error types for the lr-proto crate.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or validating frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The client sent something other than a hello as its first frame.
    #[error("unexpected command {0:?}, expected \"hello\"")]
    UnexpectedCommand(String),

    /// None of the client's protocols are supported by the server.
    #[error("no common protocol in client offer {0:?}")]
    NoCommonProtocol(Vec<String>),
}

/// Result type for protocol operations.
pub type ProtoResult<T> = Result<T, ProtoError>;
