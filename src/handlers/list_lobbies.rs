use super::Context;
use crate::protocol::{ClientFrame, ServerFrame, SignalError};

/// `LIST_LOBBIES`, spec.md §4.3.
pub fn handle(ctx: &Context, frame: &ClientFrame) -> Result<(), SignalError> {
    if !ctx.require_valid() {
        return Ok(());
    }
    let names = ctx.registry.list_lobbies(&ctx.client.game);
    ctx.client.send(
        ServerFrame::new("LIST_ACK", serde_json::json!(names)).with_listener(frame.listener.clone()),
    );
    Ok(())
}
