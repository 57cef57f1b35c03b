//! Property-style checks for the universal invariants of spec.md §8
//! (items 1-6), driven through the same handler entry points a real
//! connection uses (`CREATE_LOBBY`, `JOIN_LOBBY`, `MANAGE_LOBBY`) rather
//! than poking the registry directly, so capacity/lock/password checks
//! are exercised exactly as a client would hit them.

use std::sync::Arc;

use proptest::prelude::*;
use tokio::sync::mpsc;

use rift_signal::auth::InMemoryTokenValidator;
use rift_signal::handlers::Context;
use rift_signal::protocol::ClientFrame;
use rift_signal::registry::{ClientHandle, ClientState, Registry};
use rift_signal::relay::NullRelaySpawner;

const GAME: &str = "g1";
const LOBBY: &str = "arena";
const N_CLIENTS: usize = 4;

fn context_for(registry: &Arc<Registry>, id: &str) -> Context {
    let (tx, _rx) = mpsc::unbounded_channel();
    let client = Arc::new(ClientHandle::new(id.to_string(), GAME.to_string(), false, false, tx));
    client.authorize(format!("user_{id}"), id.to_string(), String::new());
    Context {
        registry: registry.clone(),
        relay_spawner: Arc::new(NullRelaySpawner),
        auth: Arc::new(InMemoryTokenValidator::disabled()),
        client,
        keepalive_payload_len: 16,
    }
}

fn frame(opcode: &str, payload: serde_json::Value) -> ClientFrame {
    ClientFrame {
        opcode: opcode.to_string(),
        payload,
        listener: None,
        recipient: None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Create { who: usize, max_players: i64, locked: bool },
    Join { who: usize },
    Leave { who: usize },
    Lock { who: usize },
    Unlock { who: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..N_CLIENTS, -1i64..4, any::<bool>())
            .prop_map(|(who, max_players, locked)| Op::Create { who, max_players, locked }),
        (0..N_CLIENTS).prop_map(|who| Op::Join { who }),
        (0..N_CLIENTS).prop_map(|who| Op::Leave { who }),
        (0..N_CLIENTS).prop_map(|who| Op::Lock { who }),
        (0..N_CLIENTS).prop_map(|who| Op::Unlock { who }),
    ]
}

/// After every applied op, checks spec.md §8 items 1-4 against the live
/// registry state (item 5 and 6 are checked at dedicated call sites,
/// since they require before/after comparison).
fn assert_membership_invariants(registry: &Registry) {
    let Some(lobby) = registry.find_lobby(GAME, LOBBY) else {
        return;
    };
    let mutable = lobby.mutable.lock().unwrap();

    // 2. Host disjointness.
    if let Some(host) = &mutable.host {
        assert!(
            !mutable.members.iter().any(|m| m.instance_id == host.instance_id),
            "host {} also appears in members",
            host.instance_id
        );
    }

    // 3. Capacity.
    assert!(
        mutable.max_players == -1 || mutable.members.len() as i64 <= mutable.max_players,
        "lobby over capacity: {} members, max {}",
        mutable.members.len(),
        mutable.max_players
    );

    // 4. Host continuity.
    if !mutable.members.is_empty() {
        assert!(mutable.host.is_some(), "lobby has members but no host");
    }

    // 1. Single-lobby membership (only one lobby exists in this model, so
    // this reduces to: a client in host/members isn't also uninitialized).
    let uninitialized = registry.uninitialized_peers(GAME);
    for c in mutable.host.iter().chain(mutable.members.iter()) {
        assert!(
            !uninitialized.iter().any(|u| u.instance_id == c.instance_id),
            "{} is both a lobby participant and uninitialized",
            c.instance_id
        );
    }
    drop(mutable);
}

async fn apply(registry: &Arc<Registry>, ctxs: &[Context], op: Op) {
    match op {
        Op::Create { who, max_players, locked } => {
            let ctx = &ctxs[who];
            if ctx.client.state() != ClientState::Uninitialized {
                return;
            }
            let _ = ctx
                .dispatch(frame(
                    "CREATE_LOBBY",
                    serde_json::json!({
                        "name": LOBBY,
                        "max_players": max_players,
                        "password": "",
                        "locked": locked,
                        "enable_relay": false,
                    }),
                ))
                .await;
        }
        Op::Join { who } => {
            let ctx = &ctxs[who];
            if ctx.client.state() != ClientState::Uninitialized {
                return;
            }
            let _ = ctx
                .dispatch(frame(
                    "JOIN_LOBBY",
                    serde_json::json!({"name": LOBBY, "password": ""}),
                ))
                .await;
        }
        Op::Leave { who } => {
            let ctx = &ctxs[who];
            if ctx.client.state() == ClientState::Uninitialized {
                return;
            }
            let Some(lobby_name) = ctx.client.lobby_name() else { return };
            let Some(lobby) = registry.find_lobby(GAME, &lobby_name) else { return };
            rift_signal::state_machine::update_state(
                registry,
                Some(&lobby),
                &ctx.client,
                ClientState::Uninitialized,
            );
        }
        Op::Lock { who } | Op::Unlock { who } => {
            let ctx = &ctxs[who];
            if ctx.client.state() != ClientState::Host {
                return;
            }
            let method = if matches!(op, Op::Lock { .. }) { "lock" } else { "unlock" };
            let _ = ctx
                .dispatch(frame(
                    "MANAGE_LOBBY",
                    serde_json::json!({"method": method, "args": serde_json::Value::Null}),
                ))
                .await;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Items 1-4: hold after every op in an arbitrary sequence of
    /// create/join/leave/lock/unlock across a handful of clients sharing
    /// one game and one lobby name, including repeated creates/joins that
    /// the handlers themselves reject (exists/full/locked).
    #[test]
    fn membership_invariants_hold_after_every_op(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let registry = Arc::new(Registry::new());
            let ctxs: Vec<Context> = (0..N_CLIENTS)
                .map(|i| context_for(&registry, &format!("c{i}")))
                .collect();

            for op in ops {
                apply(&registry, &ctxs, op).await;
                assert_membership_invariants(&registry);
            }
        });
    }

    /// Item 6: idempotent lock toggles -- locking twice (or unlocking
    /// twice) in a row leaves the flag exactly where the first call put it.
    #[test]
    fn lock_toggle_is_idempotent(lock_first in any::<bool>()) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let registry = Arc::new(Registry::new());
            let host = context_for(&registry, "host");
            host.dispatch(frame(
                "CREATE_LOBBY",
                serde_json::json!({"name": LOBBY, "max_players": -1, "password": "", "locked": false, "enable_relay": false}),
            )).await.unwrap();

            let method = if lock_first { "lock" } else { "unlock" };
            for _ in 0..2 {
                host.dispatch(frame(
                    "MANAGE_LOBBY",
                    serde_json::json!({"method": method, "args": serde_json::Value::Null}),
                )).await.unwrap();
            }

            let lobby = registry.find_lobby(GAME, LOBBY).unwrap();
            prop_assert_eq!(lobby.mutable.lock().unwrap().locked, lock_first);
            Ok(())
        })?;
    }
}

/// Item 5: GC closure -- once the last participant leaves an
/// otherwise-untouched game, nothing about that game remains in the
/// registry.
#[tokio::test]
async fn gc_closure_after_last_departure() {
    let registry = Arc::new(Registry::new());
    let host = context_for(&registry, "solo-host");

    host.dispatch(frame(
        "CREATE_LOBBY",
        serde_json::json!({"name": LOBBY, "max_players": -1, "password": "", "locked": false, "enable_relay": false}),
    ))
    .await
    .unwrap();
    assert!(registry.find_lobby(GAME, LOBBY).is_some());

    let lobby = registry.find_lobby(GAME, LOBBY).unwrap();
    rift_signal::state_machine::update_state(
        &registry,
        Some(&lobby),
        &host.client,
        ClientState::Destroyed,
    );

    assert!(registry.find_lobby(GAME, LOBBY).is_none());
    assert!(registry.list_lobbies(GAME).is_empty());
    assert!(registry.uninitialized_peers(GAME).is_empty());
    assert!(!registry.has_instance(GAME, "solo-host"));
}
