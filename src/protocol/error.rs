//! Error taxonomy for connection handling (spec.md §7).
//!
//! A [`SignalError`] always means the connection is closing: protocol
//! violations and authorization failures both end in a `VIOLATION` frame
//! followed by a close. Semantic rejections (lobby full, wrong password,
//! not host) are not errors in this sense -- they're `*_ACK`/`WARNING`
//! frames returned from a handler while the connection stays open.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    /// Malformed JSON, an unknown opcode, or a payload that doesn't match
    /// its opcode's schema.
    #[error("{0}")]
    Violation(String),

    /// Invalid token, expired session, or a duplicate instance id for the
    /// same game.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected failure below the protocol layer (I/O, a poisoned
    /// lock). Logged and treated the same as a violation: close the
    /// connection, never crash the server.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SignalError {
    pub fn violation(reason: impl Into<String>) -> Self {
        Self::Violation(reason.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    /// The reason text sent in the closing `VIOLATION` frame.
    pub fn close_reason(&self) -> String {
        match self {
            Self::Violation(reason) => reason.clone(),
            Self::Unauthorized(reason) => reason.clone(),
            Self::Internal(_) => "internal error".to_string(),
        }
    }
}
