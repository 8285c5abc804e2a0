//! WebSocket upgrade and frame adaptation.

use std::future;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::routes::RouteState;

/// Handle WebSocket upgrade request for `/livereload`.
///
/// Origin is not checked.
pub(crate) async fn ws_upgrade(
    State(state): State<RouteState>,
    ws: WebSocketUpgrade,
) -> Response {
    let max_message_size = state.server.config().max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: RouteState, socket: WebSocket) {
    debug!("WebSocket connection established");

    let (sink, stream) = socket.split();
    let inbound = stream.filter_map(|msg| future::ready(inbound_frame(msg)));
    let outbound = sink.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(Message::Text(text.into())))
    });

    state.server.attach(state.listener, inbound, outbound).await;
}

/// Extract the payload of a client frame.
///
/// Returns `None` for control frames the session does not care about. Binary
/// frames are accepted when they hold UTF-8 text.
pub fn inbound_frame(msg: Result<Message, axum::Error>) -> Option<ServerResult<String>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Binary(data)) => Some(
            String::from_utf8(data.to_vec())
                .map_err(|e| ServerError::Serialization(e.to_string())),
        ),
        Ok(Message::Ping(_) | Message::Pong(_)) => None,
        Ok(Message::Close(_)) => Some(Err(ServerError::ConnectionClosed)),
        Err(e) => Some(Err(ServerError::WebSocket(e.to_string()))),
    }
}
