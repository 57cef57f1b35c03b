//! Default value functions used by `#[serde(default = "...")]`.

pub fn default_port() -> u16 {
    3536
}

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub fn default_keepalive_payload_len() -> usize {
    16
}

pub fn default_max_message_bytes() -> usize {
    64 * 1024
}

pub fn default_require_auth() -> bool {
    false
}
