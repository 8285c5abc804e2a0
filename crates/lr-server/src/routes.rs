//! HTTP routes.

use std::borrow::Cow;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, Router};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::server::LiveReloadServer;
use crate::websocket::ws_upgrade;

/// Path the client script is served from.
pub const SCRIPT_PATH: &str = "/livereload.js";

/// Path browsers upgrade to a WebSocket on.
pub const WEBSOCKET_PATH: &str = "/livereload";

/// State shared by the route handlers.
#[derive(Debug, Clone)]
pub(crate) struct RouteState {
    pub(crate) server: LiveReloadServer,
    /// Listener the router was built for; `None` when served externally.
    pub(crate) listener: Option<Uuid>,
}

/// Create the LiveReload router.
///
/// For embedding in an application that runs its own HTTP server: sessions
/// opened through this router are accepted whether or not
/// [`LiveReloadServer`] itself is listening.
pub fn create_router(server: LiveReloadServer) -> Router {
    build_router(RouteState {
        server,
        listener: None,
    })
}

/// Router used by [`LiveReloadServer::serve`]; sessions are tied to `listener`.
pub(crate) fn listener_router(server: LiveReloadServer, listener: Uuid) -> Router {
    build_router(RouteState {
        server,
        listener: Some(listener),
    })
}

fn build_router(state: RouteState) -> Router {
    Router::new()
        .route(SCRIPT_PATH, get(client_script))
        .route(WEBSOCKET_PATH, get(ws_upgrade))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the LiveReload client JavaScript.
async fn client_script(State(state): State<RouteState>) -> impl IntoResponse {
    let script: Cow<'static, str> = state.server.config().client_script.clone();
    ([(header::CONTENT_TYPE, "application/javascript")], script)
}
