//! The role state machine: the only code in this crate allowed to mutate
//! a client's role or a lobby's host/member lists (spec.md §4.2).
//!
//! Every transition here is grounded on the original's `session.UpdateState`
//! (`examples/original_source/pkg/signaling/session/session.go`), translated
//! from its single giant function into one entry point per concern plus a
//! shared host-promotion helper (spec.md §9 flags the original's
//! duplication of that logic across three call sites).

use std::sync::Arc;

use crate::broadcast::broadcast;
use crate::protocol::{PeerInfo, ServerFrame};
use crate::registry::{ClientHandle, ClientState, Lobby, Registry};

fn peer_info(client: &ClientHandle) -> PeerInfo {
    PeerInfo {
        instance_id: client.instance_id.clone(),
        user_id: client.user_id(),
        username: client.username(),
        pubkey: client.public_key(),
    }
}

/// Moves `client` into `new_state` within `lobby` (or out of any lobby, if
/// `lobby` is `None`), performing every side effect the original's
/// `UpdateState` performs for the corresponding transition: removing the
/// client from its prior membership set, promoting a new host if the
/// departing client was host, sending `TRANSITION`, and triggering lobby
/// destruction / game garbage collection where applicable.
///
/// Holds the registry's lock for the whole transition, matching spec.md
/// §5's "registry-wide lock + per-client mutex acquired together".
pub fn update_state(
    registry: &Registry,
    lobby: Option<&Arc<Lobby>>,
    client: &Arc<ClientHandle>,
    new_state: ClientState,
) {
    let previous = client.state();
    tracing::debug!(
        instance_id = %client.instance_id,
        ?previous,
        ?new_state,
        "state transition"
    );

    exit_old_state(registry, lobby, client, previous);
    client.set_state_locked(new_state, lobby.map(|l| l.name.clone()));
    enter_new_state(registry, lobby, client, new_state);

    assert_host_continuity(lobby);
    collect_garbage_if_idle(registry, &client.game);
}

/// spec.md §7's "invariant violation detected at runtime: fatal; abort
/// the process" -- a lobby with members but no host immediately after a
/// transition is a programming error in the state machine, not a client
/// input, so this aborts rather than returning an error.
#[allow(clippy::panic)]
fn assert_host_continuity(lobby: Option<&Arc<Lobby>>) {
    let Some(lobby) = lobby else { return };
    let mutable = lobby.mutable.lock().unwrap();
    if !mutable.members.is_empty() && mutable.host.is_none() {
        let game = lobby.game.clone();
        let name = lobby.name.clone();
        drop(mutable);
        tracing::error!(game = %game, lobby = %name, "invariant violation: lobby has members but no host");
        panic!("invariant violation: lobby {name} in game {game} has members but no host");
    }
}

fn exit_old_state(
    registry: &Registry,
    lobby: Option<&Arc<Lobby>>,
    client: &Arc<ClientHandle>,
    previous: ClientState,
) {
    match previous {
        ClientState::Destroyed => {
            tracing::warn!(instance_id = %client.instance_id, "client's previous state was Destroyed");
        }
        ClientState::Uninitialized => {
            registry.unmark_uninitialized(&client.game, &client.instance_id);
        }
        ClientState::Host => {
            if let Some(lobby) = lobby {
                promote_next_host(lobby, client);
            }
        }
        ClientState::Member => {
            if let Some(lobby) = lobby {
                let mut mutable = lobby.mutable.lock().unwrap();
                mutable.members.retain(|m| m.instance_id != client.instance_id);
            }
        }
    }
}

fn enter_new_state(
    registry: &Registry,
    lobby: Option<&Arc<Lobby>>,
    client: &Arc<ClientHandle>,
    new_state: ClientState,
) {
    match new_state {
        ClientState::Destroyed => {
            registry.forget_client(&client.game, &client.instance_id);
            if let Some(lobby) = lobby {
                let others = lobby.everyone_except(&client.instance_id);
                broadcast(&others, ServerFrame::new("PEER_LEFT", client.instance_id.clone()));
                if client.last_state() == ClientState::Host {
                    destroy_lobby_if_empty(registry, lobby, client);
                }
            }
        }
        ClientState::Uninitialized => {
            registry.mark_uninitialized(client);
            client.send(ServerFrame::new("TRANSITION", ""));
            if client.last_state() == ClientState::Host {
                if let Some(lobby) = lobby {
                    destroy_lobby_if_empty(registry, lobby, client);
                }
            }
        }
        ClientState::Host => {
            let lobby = lobby.expect("transition to Host always carries a lobby");
            let old_host = {
                let mut mutable = lobby.mutable.lock().unwrap();
                let old_host = mutable.host.take();
                mutable.host = Some(client.clone());
                old_host
            };
            if let Some(old_host) = old_host {
                old_host.set_state_locked(ClientState::Member, Some(lobby.name.clone()));
                {
                    let mut mutable = lobby.mutable.lock().unwrap();
                    crate::registry::lobby::and(&mut mutable.members, old_host.clone());
                }
                old_host.send(ServerFrame::new("TRANSITION", "peer"));
            }
            client.send(ServerFrame::new("TRANSITION", "host"));
        }
        ClientState::Member => {
            let lobby = lobby.expect("transition to Member always carries a lobby");
            {
                let mut mutable = lobby.mutable.lock().unwrap();
                crate::registry::lobby::and(&mut mutable.members, client.clone());
            }
            client.send(ServerFrame::new("TRANSITION", "peer"));
        }
    }
}

/// Promotes `members[0]` to host when the current host (`departing`)
/// leaves a non-empty lobby. Shared by the natural-departure path; the
/// explicit-target case (`transfer_ownership`) is handled separately
/// below since it names its own successor instead of picking one.
fn promote_next_host(lobby: &Arc<Lobby>, departing: &Arc<ClientHandle>) {
    let promoted = {
        let mut mutable = lobby.mutable.lock().unwrap();
        if mutable.members.is_empty() {
            if mutable.host.as_ref().map(|h| h.instance_id.as_str())
                == Some(departing.instance_id.as_str())
            {
                mutable.host = None;
            }
            return;
        }
        let new_host = mutable.members.remove(0);
        mutable.host = Some(new_host.clone());
        new_host
    };

    promoted.set_state_locked(ClientState::Host, Some(lobby.name.clone()));
    promoted.send(ServerFrame::new("TRANSITION", "host"));

    let remaining = lobby.everyone_except(&promoted.instance_id);
    broadcast(&remaining, ServerFrame::new("NEW_HOST", serde_json::json!(peer_info(&promoted))));
}

/// Explicit host handoff for `MANAGE_LOBBY transfer_ownership`
/// (spec.md §8 scenario S5). Unlike natural departure, the successor is
/// named by the caller rather than chosen by position, and the departing
/// host becomes a regular member instead of leaving the lobby.
pub fn transfer_ownership(lobby: &Arc<Lobby>, current_host: &Arc<ClientHandle>, new_host: &Arc<ClientHandle>) {
    {
        let mut mutable = lobby.mutable.lock().unwrap();
        mutable.members.retain(|m| m.instance_id != new_host.instance_id);
        mutable.host = Some(new_host.clone());
        crate::registry::lobby::and(&mut mutable.members, current_host.clone());
    }
    current_host.set_state_locked(ClientState::Member, Some(lobby.name.clone()));
    new_host.set_state_locked(ClientState::Host, Some(lobby.name.clone()));

    current_host.send(ServerFrame::new("TRANSITION", "peer"));
    new_host.send(ServerFrame::new("TRANSITION", "host"));

    let remaining = lobby.everyone_except(&new_host.instance_id);
    broadcast(&remaining, ServerFrame::new("NEW_HOST", serde_json::json!(peer_info(new_host))));
}

/// Tears the lobby down once both its host and member lists are empty and
/// the departing client was the last host (spec.md §4.2's destruction
/// rule). Relay teardown, if any, happens synchronously before the lobby
/// is dropped from the registry.
fn destroy_lobby_if_empty(registry: &Registry, lobby: &Arc<Lobby>, departed_host: &Arc<ClientHandle>) {
    if !lobby.is_empty_of_participants() {
        return;
    }

    if let Some(mut relay) = registry.take_relay(&lobby.game, &lobby.name) {
        let game = lobby.game.clone();
        let name = lobby.name.clone();
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(relay.shutdown());
        });
        tracing::info!(game = %game, lobby = %name, "relay destroyed");
    }

    registry.remove_lobby(&lobby.game, &lobby.name);
    tracing::info!(game = %lobby.game, lobby = %lobby.name, "lobby destroyed");

    let uninitialized = registry.uninitialized_peers(&departed_host.game);
    broadcast(&uninitialized, ServerFrame::new("LOBBY_CLOSED", lobby.name.clone()));
}

fn collect_garbage_if_idle(registry: &Registry, game: &str) {
    registry.collect_garbage(game);
}
