//! Handshake validation.

use crate::error::{ProtoError, ProtoResult};
use crate::messages::{ClientHello, SUPPORTED_PROTOCOLS};

/// Command name of the handshake frame.
pub const HELLO_COMMAND: &str = "hello";

/// Check whether the server speaks the given protocol URI.
#[must_use]
pub fn is_supported(protocol: &str) -> bool {
    SUPPORTED_PROTOCOLS.contains(&protocol)
}

/// Protocols offered by the client that the server also supports, in the
/// client's order.
#[must_use]
pub fn shared_protocols(hello: &ClientHello) -> Vec<&str> {
    hello
        .protocols
        .iter()
        .map(String::as_str)
        .filter(|p| is_supported(p))
        .collect()
}

/// Validate a client hello.
///
/// # Errors
///
/// Returns [`ProtoError::UnexpectedCommand`] if the command is not `"hello"`
/// and [`ProtoError::NoCommonProtocol`] if the offer does not intersect
/// [`SUPPORTED_PROTOCOLS`].
pub fn validate_hello(hello: &ClientHello) -> ProtoResult<()> {
    if hello.command != HELLO_COMMAND {
        return Err(ProtoError::UnexpectedCommand(hello.command.clone()));
    }
    if shared_protocols(hello).is_empty() {
        return Err(ProtoError::NoCommonProtocol(hello.protocols.clone()));
    }
    Ok(())
}
