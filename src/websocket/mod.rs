//! Axum WebSocket transport glue: upgrade handling, the read/dispatch
//! loop, and the per-client writer task (spec.md §6).
//!
//! - `routes`: HTTP route setup (the `/v1/ws` upgrade endpoint, CORS).
//! - `handler`: the upgrade entry point, UGI extraction.
//! - `connection`: the read loop, dispatch, and writer task.

mod connection;
mod handler;
mod routes;

pub use routes::{create_router, AppState};
