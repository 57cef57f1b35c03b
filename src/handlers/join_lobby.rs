use super::Context;
use crate::broadcast::broadcast;
use crate::protocol::{ClientFrame, JoinLobbyArgs, PeerInfo, ServerFrame, SignalError};
use crate::registry::ClientState;
use crate::state_machine::update_state;

/// `JOIN_LOBBY`, spec.md §4.3. Checks run in order: existence, lock,
/// capacity, password.
pub fn handle(ctx: &Context, frame: &ClientFrame) -> Result<(), SignalError> {
    if !ctx.require_valid() {
        return Ok(());
    }

    let args: JoinLobbyArgs = serde_json::from_value(frame.payload.clone())
        .map_err(|e| SignalError::violation(format!("malformed JOIN_LOBBY payload: {e}")))?;

    let ack = |reason: &str| {
        ServerFrame::new("JOIN_ACK", reason).with_listener(frame.listener.clone())
    };

    let Some(lobby) = ctx.registry.find_lobby(&ctx.client.game, &args.name) else {
        ctx.client.send(ack("not found"));
        return Ok(());
    };

    let (host, relay_id) = {
        let mutable = lobby.mutable.lock().unwrap();
        if mutable.locked {
            drop(mutable);
            ctx.client.send(ack("locked"));
            return Ok(());
        }
        let full = mutable.max_players != -1 && mutable.members.len() as i64 >= mutable.max_players;
        if full {
            drop(mutable);
            ctx.client.send(ack("full"));
            return Ok(());
        }
        if !mutable.password.is_empty() && mutable.password != args.password {
            drop(mutable);
            ctx.client.send(ack("password"));
            return Ok(());
        }
        (mutable.host.clone(), mutable.relay_id.clone())
    };

    update_state(&ctx.registry, Some(&lobby), &ctx.client, ClientState::Member);
    ctx.client.send(ack("ok"));

    if let Some(host) = host {
        ctx.client.send(ServerFrame::new(
            "NEW_HOST",
            serde_json::to_value(PeerInfo {
                instance_id: host.instance_id.clone(),
                user_id: host.user_id(),
                username: host.username(),
                pubkey: host.public_key(),
            })
            .expect("PeerInfo always serializes"),
        ));
        host.send(ServerFrame::new(
            "NEW_PEER",
            serde_json::to_value(PeerInfo {
                instance_id: ctx.client.instance_id.clone(),
                user_id: ctx.client.user_id(),
                username: ctx.client.username(),
                pubkey: ctx.client.public_key(),
            })
            .expect("PeerInfo always serializes"),
        ));
    }

    let others = lobby.members_except(&ctx.client.instance_id);
    broadcast(
        &others,
        ServerFrame::new(
            "PEER_JOIN",
            serde_json::to_value(PeerInfo {
                instance_id: ctx.client.instance_id.clone(),
                user_id: ctx.client.user_id(),
                username: ctx.client.username(),
                pubkey: ctx.client.public_key(),
            })
            .expect("PeerInfo always serializes"),
        ),
    );

    if let Some(relay_id) = relay_id {
        ctx.client.send(ServerFrame::new("RELAY", relay_id));
    }

    Ok(())
}
