use super::Context;
use crate::protocol::{ClientFrame, ServerFrame, SignalError};

/// `KEEPALIVE`, spec.md §4.3: valid on any client state, no side effects
/// beyond the reply.
pub fn handle(ctx: &Context, frame: &ClientFrame) -> Result<(), SignalError> {
    let mut nonce = vec![0u8; ctx.keepalive_payload_len];
    rand::fill(nonce.as_mut_slice());
    ctx.client.send(
        ServerFrame::new("KEEPALIVE_ACK", serde_json::json!(nonce))
            .with_listener(frame.listener.clone()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;

    #[test]
    fn keepalive_replies_with_sixteen_bytes() {
        let ctx = context("g1", "a");
        let frame = ClientFrame {
            opcode: "KEEPALIVE".into(),
            payload: serde_json::Value::Null,
            listener: None,
            recipient: None,
        };
        assert!(handle(&ctx, &frame).is_ok());
    }
}
