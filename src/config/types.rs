//! Root `Config` struct.

use super::defaults::{
    default_cors_origins, default_keepalive_payload_len, default_max_message_bytes, default_port,
    default_require_auth,
};
use super::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// A single statically-configured auth entry: the in-memory stand-in for
/// the external token/cookie authenticator the spec treats as a pure
/// `validate(token) -> (ok, claims)` predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEntry {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// When true, `INIT` must present a token matching one of `auth.entries`.
    /// When false, any token (or none) is accepted and a guest identity is
    /// synthesized, matching the teacher's `AuthMiddleware::disabled()`.
    #[serde(default = "default_require_auth")]
    pub require_auth: bool,

    #[serde(default)]
    pub auth_entries: Vec<AuthEntry>,

    /// Length, in bytes, of the random nonce sent with `KEEPALIVE_ACK`.
    #[serde(default = "default_keepalive_payload_len")]
    pub keepalive_payload_len: usize,

    /// Frames larger than this are a protocol violation.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origins: default_cors_origins(),
            logging: LoggingConfig::default(),
            require_auth: default_require_auth(),
            auth_entries: Vec::new(),
            keepalive_payload_len: default_keepalive_payload_len(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}
