use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenValidator;
use crate::config::Config;
use crate::registry::Registry;
use crate::relay::SharedRelaySpawner;

use super::handler::websocket_handler;

/// Everything the router needs cloned into every request handler.
pub struct AppState {
    pub registry: Arc<Registry>,
    pub relay_spawner: SharedRelaySpawner,
    pub auth: Arc<dyn TokenValidator>,
    pub config: Arc<Config>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors(&state.config.cors_origins);

    Router::new()
        .route("/v1/ws", get(websocket_handler))
        .route("/healthz", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors(cors_origins: &str) -> CorsLayer {
    if cors_origins == "*" {
        return CorsLayer::permissive();
    }
    let origins: Vec<_> = cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();
    if origins.is_empty() {
        tracing::warn!("no valid CORS origins configured, falling back to permissive CORS");
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check() -> &'static str {
    "OK"
}
