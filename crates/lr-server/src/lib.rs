//! # lr-server
//!
//! LiveReload server: serves the browser client script and pushes reload and
//! alert commands to the connected page over a WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   GET /livereload.js   ┌──────────────────────┐
//! │   browser    │───────────────────────►│   LiveReloadServer   │
//! │              │                        │                      │
//! │ livereload.js│   WS /livereload       │  ┌────────────────┐  │
//! │              │◄──────────────────────►│  │ Session (one   │  │
//! └──────────────┘                        │  │ installed at a │  │
//!                                         │  │ time)          │  │
//! ┌──────────────┐   reload() / alert()   │  └────────────────┘  │
//! │ file watcher │───────────────────────►│                      │
//! └──────────────┘                        └──────────────────────┘
//! ```
//!
//! File watching is left to the embedding application, which calls
//! [`LiveReloadServer::reload`] and [`LiveReloadServer::alert`] from any
//! thread.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use lr_server::{LiveReloadServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = LiveReloadServer::new(ServerConfig::default().with_name("my-site"));
//!
//!     let handle = {
//!         let server = server.clone();
//!         tokio::spawn(async move { server.listen_and_serve().await })
//!     };
//!
//!     // Later, from a watcher callback:
//!     server.reload("css/site.css");
//!
//!     server.shutdown().ok();
//!     let _ = handle.await;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod session;
pub mod websocket;

// Re-export main types
pub use config::{
    ServerConfig, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT, DEFAULT_SERVER_NAME, LIVERELOAD_JS,
};
pub use error::{ServerError, ServerResult};
pub use routes::{create_router, SCRIPT_PATH, WEBSOCKET_PATH};
pub use server::LiveReloadServer;
pub use session::{Session, SessionHandle, SessionRequest, SessionState};
