//! # lr-proto
//!
//! Wire definitions for the LiveReload browser protocol.
//!
//! The browser opens a WebSocket, sends a [`ClientHello`] listing the protocol
//! URIs it speaks, and the server answers with [`ServerMessage::Hello`] when at
//! least one of them is in [`SUPPORTED_PROTOCOLS`]. After that the server may
//! push [`ServerMessage::Reload`] and [`ServerMessage::Alert`] frames at any
//! time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handshake;
pub mod messages;

pub use error::{ProtoError, ProtoResult};
pub use handshake::{is_supported, shared_protocols, validate_hello, HELLO_COMMAND};
pub use messages::{ClientHello, ServerMessage, SUPPORTED_PROTOCOLS};
