//! Opcode-specific payload shapes. Field names follow the wire format of
//! the original `cloudlink-omega/signaling` implementation
//! (`pkg/structs/packets.go`), which the distilled spec's prose is a
//! summary of.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitArgs {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, rename = "pubkey")]
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitOk {
    pub instance_id: String,
    pub user_id: String,
    pub username: String,
}

/// The `{instance_id, user_id, username, pubkey?}` peer descriptor used
/// by `NEW_HOST`, `NEW_PEER`, and `PEER_JOIN`.
#[derive(Debug, Clone, Serialize)]
pub struct PeerInfo {
    pub instance_id: String,
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pubkey: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLobbyArgs {
    pub name: String,
    #[serde(default = "default_max_players")]
    pub max_players: i64,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub enable_relay: bool,
}

fn default_max_players() -> i64 {
    -1
}

#[derive(Debug, Clone, Serialize)]
pub struct FindLobbyAck {
    pub host: PeerInfo,
    pub max_players: i64,
    pub current_players: u64,
    pub currently_locked: bool,
    pub password_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinLobbyArgs {
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManageLobbyArgs {
    pub method: String,
    #[serde(default)]
    pub args: serde_json::Value,
}
