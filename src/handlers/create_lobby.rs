use super::Context;
use crate::broadcast::broadcast;
use crate::protocol::{ClientFrame, CreateLobbyArgs, PeerInfo, ServerFrame, SignalError};
use crate::registry::ClientState;
use crate::state_machine::update_state;

/// `CREATE_LOBBY`, spec.md §4.3. Existence is scoped by `(game, name)`
/// per spec.md §9's resolved Open Question.
pub async fn handle(ctx: &Context, frame: &ClientFrame) -> Result<(), SignalError> {
    if !ctx.require_valid() {
        return Ok(());
    }

    let args: CreateLobbyArgs = serde_json::from_value(frame.payload.clone())
        .map_err(|e| SignalError::violation(format!("malformed CREATE_LOBBY payload: {e}")))?;

    let Some(lobby) = ctx.registry.create_lobby(
        &ctx.client.game,
        &args.name,
        args.password,
        args.max_players,
        args.locked,
        args.enable_relay,
    ) else {
        ctx.client.send(
            ServerFrame::new("CREATE_ACK", "exists").with_listener(frame.listener.clone()),
        );
        return Ok(());
    };

    update_state(&ctx.registry, Some(&lobby), &ctx.client, ClientState::Host);

    ctx.client
        .send(ServerFrame::new("CREATE_ACK", "ok").with_listener(frame.listener.clone()));

    ctx.client.send(ServerFrame::new(
        "NEW_HOST",
        serde_json::to_value(PeerInfo {
            instance_id: ctx.client.instance_id.clone(),
            user_id: ctx.client.user_id(),
            username: ctx.client.username(),
            pubkey: ctx.client.public_key(),
        })
        .expect("PeerInfo always serializes"),
    ));

    let uninitialized = ctx.registry.uninitialized_peers(&ctx.client.game);
    broadcast(&uninitialized, ServerFrame::new("NEW_LOBBY", args.name.clone()));

    if args.enable_relay {
        match ctx.relay_spawner.spawn(&ctx.client.game, &args.name).await {
            Ok(handle) => {
                let relay_id = handle.id.clone();
                {
                    let mut mutable = lobby.mutable.lock().unwrap();
                    mutable.relay_id = Some(relay_id.clone());
                }
                ctx.registry.insert_relay(&ctx.client.game, &args.name, handle);
                ctx.client.send(ServerFrame::new("RELAY", relay_id));
            }
            Err(e) => {
                tracing::warn!(lobby = %args.name, error = %e, "relay spawn failed, continuing without one");
                let mut mutable = lobby.mutable.lock().unwrap();
                mutable.relay_enabled = false;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::valid_context;

    fn frame(name: &str, enable_relay: bool) -> ClientFrame {
        ClientFrame {
            opcode: "CREATE_LOBBY".into(),
            payload: serde_json::json!({
                "name": name,
                "max_players": -1,
                "password": "",
                "locked": false,
                "enable_relay": enable_relay,
            }),
            listener: None,
            recipient: None,
        }
    }

    #[tokio::test]
    async fn creating_twice_reports_exists() {
        let ctx = valid_context("g1", "a");
        assert!(handle(&ctx, &frame("x", false)).await.is_ok());
        assert!(handle(&ctx, &frame("x", false)).await.is_ok());
        assert_eq!(ctx.registry.list_lobbies("g1").len(), 1);
    }

    #[tokio::test]
    async fn creator_becomes_host() {
        let ctx = valid_context("g1", "a");
        assert!(handle(&ctx, &frame("x", false)).await.is_ok());
        assert_eq!(ctx.client.state(), ClientState::Host);
    }

    #[tokio::test]
    async fn relay_spawn_failure_downgrades_silently() {
        let ctx = valid_context("g1", "a");
        assert!(handle(&ctx, &frame("x", true)).await.is_ok());
        let lobby = ctx.registry.find_lobby("g1", "x").unwrap();
        assert!(!lobby.mutable.lock().unwrap().relay_enabled);
    }
}
