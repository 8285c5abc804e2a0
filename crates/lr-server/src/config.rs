//! Server configuration.

use std::borrow::Cow;
use std::net::SocketAddr;

/// Well-known LiveReload port.
pub const DEFAULT_PORT: u16 = 35729;

/// Name echoed to browsers as `serverName` unless overridden.
pub const DEFAULT_SERVER_NAME: &str = "lrserver";

/// Default maximum inbound WebSocket message size: 64KB.
///
/// Browsers only ever send a short hello frame.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Client script served at `/livereload.js` unless overridden.
pub const LIVERELOAD_JS: &str = include_str!("../assets/livereload.js");

/// Configuration for a LiveReload server.
///
/// Immutable once handed to [`LiveReloadServer`](crate::LiveReloadServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP/WebSocket listener to.
    pub bind_addr: SocketAddr,
    /// Display name sent in the handshake response.
    pub name: String,
    /// Whether reload frames allow in-place stylesheet swaps.
    pub live_css: bool,
    /// JavaScript served to browsers at `/livereload.js`.
    pub client_script: Cow<'static, str>,
    /// Largest client frame accepted, in bytes.
    pub max_message_size: usize,
}

impl ServerConfig {
    /// Create a configuration bound to the given address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            name: DEFAULT_SERVER_NAME.to_string(),
            live_css: true,
            client_script: Cow::Borrowed(LIVERELOAD_JS),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Set the server name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the port, keeping the bind IP.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Enable or disable live CSS reloading.
    #[must_use]
    pub const fn with_live_css(mut self, live_css: bool) -> Self {
        self.live_css = live_css;
        self
    }

    /// Replace the served client script.
    #[must_use]
    pub fn with_client_script(mut self, script: impl Into<Cow<'static, str>>) -> Self {
        self.client_script = script.into();
        self
    }

    /// Set the maximum inbound message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(([0, 0, 0, 0], DEFAULT_PORT).into())
    }
}
