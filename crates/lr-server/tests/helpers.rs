//! Test helpers for LiveReload integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use lr_server::{LiveReloadServer, ServerConfig, ServerResult};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{client_async, connect_async, MaybeTlsStream, WebSocketStream};

/// Default test timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a browser waits before deciding nothing is coming.
pub const QUIET_PERIOD: Duration = Duration::from_millis(250);

/// Protocols offered by livereload-js.
pub const BROWSER_PROTOCOLS: [&str; 3] = [
    "http://livereload.com/protocols/official-7",
    "http://livereload.com/protocols/official-8",
    "http://livereload.com/protocols/2.x-origin-version-negotiation",
];

/// Server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub server: LiveReloadServer,
    handle: JoinHandle<ServerResult<()>>,
}

impl TestServer {
    /// Start a server with the given configuration on 127.0.0.1.
    pub async fn start(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = LiveReloadServer::new(config);
        Self::serve(server, listener).await
    }

    /// Start a server with default settings.
    pub async fn start_default() -> Self {
        Self::start(ServerConfig::default()).await
    }

    /// Serve an existing server instance on a bound listener.
    pub async fn serve(server: LiveReloadServer, listener: TcpListener) -> Self {
        let addr = listener.local_addr().unwrap();
        let handle = {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener).await })
        };
        timeout(TEST_TIMEOUT, async {
            while !server.is_listening() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        Self {
            addr,
            server,
            handle,
        }
    }

    /// WebSocket URL browsers connect to.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/livereload", self.addr)
    }

    /// Connect a browser without performing the handshake.
    pub async fn connect(&self) -> TestBrowser {
        TestBrowser::connect(&self.ws_url()).await
    }

    /// Connect a browser and complete the handshake.
    pub async fn connect_and_handshake(&self) -> TestBrowser {
        let mut browser = self.connect().await;
        let hello = browser.handshake().await;
        assert_eq!(hello["command"], "hello");
        browser
    }

    /// Wait until the server sees a handshaken session.
    pub async fn wait_connected(&self) {
        timeout(TEST_TIMEOUT, async {
            while !self.server.is_connected() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    /// Wait until the server has no handshaken session.
    pub async fn wait_disconnected(&self) {
        timeout(TEST_TIMEOUT, async {
            while self.server.is_connected() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    /// Wait for the serve task to finish.
    pub async fn join(self) -> ServerResult<()> {
        timeout(TEST_TIMEOUT, self.handle).await.unwrap().unwrap()
    }
}

/// WebSocket client standing in for the browser script.
pub struct TestBrowser {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestBrowser {
    /// Open the WebSocket.
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = timeout(TEST_TIMEOUT, connect_async(url))
            .await
            .unwrap()
            .unwrap();
        Self { ws }
    }

    /// Upgrade an already-open TCP connection.
    pub async fn upgrade(url: &str, stream: TcpStream) -> Result<Self, WsError> {
        let (ws, _) = timeout(TEST_TIMEOUT, client_async(url, MaybeTlsStream::Plain(stream)))
            .await
            .unwrap()?;
        Ok(Self { ws })
    }

    /// Send a text frame, ignoring a connection the server already dropped.
    pub async fn try_send_text(&mut self, text: &str) {
        let _ = self.ws.send(WsMessage::Text(text.to_string())).await;
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: &str) {
        self.ws.send(WsMessage::Text(text.to_string())).await.unwrap();
    }

    /// Send a JSON value as a text frame.
    pub async fn send_json(&mut self, value: &Value) {
        self.send_text(&value.to_string()).await;
    }

    /// Send the hello livereload-js sends and return the server's answer.
    pub async fn handshake(&mut self) -> Value {
        self.send_json(&serde_json::json!({
            "command": "hello",
            "protocols": BROWSER_PROTOCOLS,
        }))
        .await;
        self.recv().await.expect("server hello")
    }

    /// Receive the next JSON frame, or `None` if the connection ended.
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            let msg = timeout(TEST_TIMEOUT, self.ws.next()).await.ok()??.ok()?;
            match msg {
                WsMessage::Text(text) => return Some(serde_json::from_str(&text).unwrap()),
                WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
                _ => return None,
            }
        }
    }

    /// Assert no frame arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let next = timeout(QUIET_PERIOD, self.ws.next()).await;
        assert!(next.is_err(), "unexpected frame: {next:?}");
    }

    /// Assert the server dropped the connection without sending a frame.
    pub async fn expect_dropped(&mut self) {
        let next = timeout(TEST_TIMEOUT, self.ws.next())
            .await
            .expect("connection should end");
        match next {
            None | Some(Err(_)) => {}
            Some(Ok(WsMessage::Text(text))) => panic!("unexpected frame: {text}"),
            Some(Ok(other)) => panic!("expected abrupt close, got {other:?}"),
        }
    }
}
