//! The `{opcode, payload, listener?, recipient?}` wire envelope (spec.md §3, §6).
//!
//! Payloads are intentionally untyped at this layer (`serde_json::Value`)
//! and re-parsed into an opcode-specific shape at the dispatch boundary,
//! per spec.md §9's "dynamic payloads" design note -- reject there, not
//! deeper in a handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub opcode: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub listener: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerFrame {
    pub opcode: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener: Option<String>,
}

impl ServerFrame {
    pub fn new(opcode: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            opcode: opcode.into(),
            payload: payload.into(),
            listener: None,
        }
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Option<String>) -> Self {
        self.listener = listener;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_frame() {
        let raw = r#"{"opcode":"KEEPALIVE"}"#;
        let frame: ClientFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.opcode, "KEEPALIVE");
        assert!(frame.payload.is_null());
        assert!(frame.listener.is_none());
    }

    #[test]
    fn echoes_listener_when_present() {
        let frame = ServerFrame::new("INIT_OK", serde_json::json!({"a": 1}))
            .with_listener(Some("abc".to_string()));
        let encoded = serde_json::to_value(&frame).unwrap();
        assert_eq!(encoded["listener"], "abc");
    }

    #[test]
    fn omits_listener_when_absent() {
        let frame = ServerFrame::new("KEEPALIVE_ACK", serde_json::json!([1, 2, 3]));
        let encoded = serde_json::to_value(&frame).unwrap();
        assert!(encoded.get("listener").is_none());
    }
}
