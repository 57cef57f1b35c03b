use super::Context;
use crate::protocol::{ClientFrame, ManageLobbyArgs, ServerFrame, SignalError};
use crate::registry::{ClientState, lobby};
use crate::state_machine::{transfer_ownership, update_state};

/// `MANAGE_LOBBY`, spec.md §4.3. Caller must currently be a lobby host;
/// every method below replies `MANAGE_ACK` with a stable string code.
pub fn handle(ctx: &Context, frame: &ClientFrame) -> Result<(), SignalError> {
    if !ctx.require_valid() {
        return Ok(());
    }
    if ctx.client.state() != ClientState::Host {
        ctx.client
            .send(ServerFrame::new("WARNING", "unauthorized"));
        return Ok(());
    }

    let Some(lobby_name) = ctx.client.lobby_name() else {
        ctx.client
            .send(ServerFrame::new("WARNING", "unauthorized"));
        return Ok(());
    };
    let Some(lobby) = ctx.registry.find_lobby(&ctx.client.game, &lobby_name) else {
        ctx.client
            .send(ServerFrame::new("WARNING", "unauthorized"));
        return Ok(());
    };

    let args: ManageLobbyArgs = serde_json::from_value(frame.payload.clone())
        .map_err(|e| SignalError::violation(format!("malformed MANAGE_LOBBY payload: {e}")))?;

    let ack = |payload: &str| {
        ServerFrame::new("MANAGE_ACK", payload).with_listener(frame.listener.clone())
    };

    match args.method.as_str() {
        "lock" => {
            lobby.mutable.lock().unwrap().locked = true;
            ctx.client.send(ack("ok"));
        }
        "unlock" => {
            lobby.mutable.lock().unwrap().locked = false;
            ctx.client.send(ack("ok"));
        }
        "kick" => {
            let Some(target_id) = args.args.as_str() else {
                ctx.client
                    .send(ack("type error: argument (peer id) should be a string"));
                return Ok(());
            };
            let target = {
                let mutable = lobby.mutable.lock().unwrap();
                lobby::find(&mutable.members, target_id).cloned()
            };
            let Some(target) = target else {
                ctx.client.send(ack("no peer found"));
                return Ok(());
            };
            target.close("WARNING", "You have been kicked from the lobby.");
            ctx.client.send(ack("ok"));
        }
        "change_password" => {
            let Some(new_password) = args.args.as_str() else {
                ctx.client.send(ack(
                    "type error: argument (new password) should be a string",
                ));
                return Ok(());
            };
            lobby.mutable.lock().unwrap().password = new_password.to_string();
            ctx.client.send(ack("ok"));
        }
        "change_max_players" => {
            let Some(new_max) = args.args.as_i64() else {
                ctx.client.send(ack(
                    "type error: argument (max players) should be an integer",
                ));
                return Ok(());
            };
            if new_max < -1 {
                ctx.client.send(ack(
                    "value error: argument (max players) should at least be -1 (unlimited), greater than or equal to than the current number of peers in the lobby",
                ));
                return Ok(());
            }
            let mut mutable = lobby.mutable.lock().unwrap();
            if new_max != -1 && mutable.members.len() as i64 > new_max {
                ctx.client.send(ServerFrame::new(
                    "WARNING",
                    "new size is smaller than the current number of peers in the lobby",
                ));
            }
            mutable.max_players = new_max;
            drop(mutable);
            ctx.client.send(ack("ok"));
        }
        "close_lobby" => {
            let members: Vec<_> = lobby.mutable.lock().unwrap().members.clone();
            for member in &members {
                update_state(&ctx.registry, Some(&lobby), member, ClientState::Uninitialized);
            }
            update_state(&ctx.registry, Some(&lobby), &ctx.client, ClientState::Uninitialized);
            ctx.client.send(ack("ok"));
        }
        "transfer_ownership" => {
            let Some(target_id) = args.args.as_str() else {
                ctx.client.send(ack(
                    "type error: argument (peer id) should be a string",
                ));
                return Ok(());
            };
            let target = {
                let mutable = lobby.mutable.lock().unwrap();
                lobby::find(&mutable.members, target_id).cloned()
            };
            let Some(target) = target else {
                ctx.client.send(ack("no peer found"));
                return Ok(());
            };
            transfer_ownership(&lobby, &ctx.client, &target);
            ctx.client.send(ack("ok"));
        }
        other => {
            ctx.client
                .send(ack(&format!("unknown method \"{other}\"")));
        }
    }

    Ok(())
}
