//! Protocol message definitions.

use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, ProtoResult};

/// Protocol URIs the server speaks, in the order they are advertised.
pub const SUPPORTED_PROTOCOLS: [&str; 5] = [
    "http://livereload.com/protocols/official-7",
    "http://livereload.com/protocols/official-8",
    "http://livereload.com/protocols/official-9",
    "http://livereload.com/protocols/2.x-origin-version-negotiation",
    "http://livereload.com/protocols/2.x-remote-control",
];

/// Hello frame sent by the browser when it connects.
///
/// Missing fields decode as empty so that a structurally valid but wrong frame
/// is rejected by validation rather than by the decoder. Extra fields sent by
/// newer clients (`ver`, `ext`, ...) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientHello {
    /// Command name, `"hello"` for a well-formed handshake.
    #[serde(default)]
    pub command: String,
    /// Protocol URIs offered by the client.
    #[serde(default)]
    pub protocols: Vec<String>,
}

impl ClientHello {
    /// Create a hello offering the given protocols.
    #[must_use]
    pub fn new<I, S>(protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: crate::handshake::HELLO_COMMAND.to_string(),
            protocols: protocols.into_iter().map(Into::into).collect(),
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ProtoResult<String> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of the expected shape.
    pub fn from_json(json: &str) -> ProtoResult<Self> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

/// Frames sent from the server to the browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Handshake response.
    Hello {
        /// Every protocol the server supports.
        protocols: Vec<String>,
        /// Display name of the server.
        #[serde(rename = "serverName")]
        server_name: String,
    },
    /// Ask the browser to reload a resource.
    Reload {
        /// Path of the changed file.
        path: String,
        /// Whether stylesheets may be swapped in place.
        #[serde(rename = "liveCSS")]
        live_css: bool,
    },
    /// Ask the browser to show a message.
    Alert {
        /// Text to display.
        message: String,
    },
}

impl ServerMessage {
    /// Create the handshake response advertising [`SUPPORTED_PROTOCOLS`].
    #[must_use]
    pub fn hello(server_name: impl Into<String>) -> Self {
        Self::Hello {
            protocols: SUPPORTED_PROTOCOLS.iter().map(ToString::to_string).collect(),
            server_name: server_name.into(),
        }
    }

    /// Create a reload command.
    #[must_use]
    pub fn reload(path: impl Into<String>, live_css: bool) -> Self {
        Self::Reload {
            path: path.into(),
            live_css,
        }
    }

    /// Create an alert command.
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::Alert {
            message: message.into(),
        }
    }

    /// Name of the `command` field for this frame.
    #[must_use]
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Reload { .. } => "reload",
            Self::Alert { .. } => "alert",
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ProtoResult<String> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> ProtoResult<Self> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
