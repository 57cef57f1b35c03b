use super::Context;
use crate::protocol::{ClientFrame, FindLobbyAck, PeerInfo, ServerFrame, SignalError};

/// `FIND_LOBBY`, spec.md §4.3. Payload is the lobby name itself, not an
/// object.
pub fn handle(ctx: &Context, frame: &ClientFrame) -> Result<(), SignalError> {
    if !ctx.require_valid() {
        return Ok(());
    }

    let Some(name) = frame.payload.as_str() else {
        ctx.client.send(
            ServerFrame::new("FIND_ACK", "not found").with_listener(frame.listener.clone()),
        );
        return Ok(());
    };

    let Some(lobby) = ctx.registry.find_lobby(&ctx.client.game, name) else {
        ctx.client.send(
            ServerFrame::new("FIND_ACK", "not found").with_listener(frame.listener.clone()),
        );
        return Ok(());
    };

    let mutable = lobby.mutable.lock().unwrap();
    let Some(host) = mutable.host.as_ref() else {
        drop(mutable);
        ctx.client.send(
            ServerFrame::new("FIND_ACK", "not found").with_listener(frame.listener.clone()),
        );
        return Ok(());
    };

    let ack = FindLobbyAck {
        host: PeerInfo {
            instance_id: host.instance_id.clone(),
            user_id: host.user_id(),
            username: host.username(),
            pubkey: host.public_key(),
        },
        max_players: mutable.max_players,
        current_players: mutable.members.len() as u64,
        currently_locked: mutable.locked,
        password_required: !mutable.password.is_empty(),
    };
    drop(mutable);

    ctx.client.send(
        ServerFrame::new("FIND_ACK", serde_json::to_value(ack).expect("FindLobbyAck always serializes"))
            .with_listener(frame.listener.clone()),
    );
    Ok(())
}
