#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_arguments
)]

//! # rift-signal
//!
//! An in-memory WebSocket signaling server for WebRTC peer rendezvous.
//! Peers are partitioned by a Game ID and, within a game, by named
//! lobbies; the server brokers SDP/ICE material between lobby members
//! but never touches the data plane itself.

/// In-memory token validation (stand-in for an external auth service).
pub mod auth;

/// Server configuration: layered JSON/env loading.
pub mod config;

/// Structured logging setup.
pub mod logging;

/// Wire protocol: envelope, payload types, error taxonomy.
pub mod protocol;

/// The registry: process-wide client/lobby/relay bookkeeping.
pub mod registry;

/// The role state machine -- the sole admitted mutator of registry state.
pub mod state_machine;

/// Per-recipient ordered broadcast fan-out.
pub mod broadcast;

/// Black-box relay spawn/destroy lifecycle.
pub mod relay;

/// Opcode handlers and dispatch.
pub mod handlers;

/// Axum WebSocket transport glue.
pub mod websocket;
