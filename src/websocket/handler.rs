use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::connection::handle_socket;
use super::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    ugi: Option<String>,
    token: Option<String>,
}

/// Upgrades the connection unconditionally; a missing UGI is rejected
/// over the socket itself with `VIOLATION`, matching spec.md §6's close
/// semantics rather than an HTTP-level rejection.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.ugi, params.token))
}
