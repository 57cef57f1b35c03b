//! Opcode handlers and dispatch (spec.md §4.3, §6). Each submodule owns
//! one opcode's parsing, checks, and side effects; `Context::dispatch`
//! only routes.

mod create_lobby;
mod find_lobby;
mod init;
mod join_lobby;
mod keepalive;
mod list_lobbies;
mod manage_lobby;

use std::sync::Arc;

use crate::auth::TokenValidator;
use crate::protocol::{ClientFrame, SignalError};
use crate::registry::{ClientHandle, Registry};
use crate::relay::SharedRelaySpawner;

/// Everything a handler needs: the shared registry, the relay spawner,
/// the auth predicate, and the client the frame arrived on.
pub struct Context {
    pub registry: Arc<Registry>,
    pub relay_spawner: SharedRelaySpawner,
    pub auth: Arc<dyn TokenValidator>,
    pub client: Arc<ClientHandle>,
    pub keepalive_payload_len: usize,
}

impl Context {
    /// Requires the client to have completed `INIT`; replies
    /// `WARNING "unauthorized"` and returns `false` otherwise, matching
    /// every non-`INIT`/`KEEPALIVE` handler's first check in the original.
    fn require_valid(&self) -> bool {
        if self.client.is_valid() {
            return true;
        }
        self.client
            .send(crate::protocol::ServerFrame::new("WARNING", "unauthorized"));
        false
    }

    pub async fn dispatch(&self, frame: ClientFrame) -> Result<(), SignalError> {
        match frame.opcode.as_str() {
            "INIT" => init::handle(self, &frame),
            "KEEPALIVE" => keepalive::handle(self, &frame),
            "LIST_LOBBIES" => list_lobbies::handle(self, &frame),
            "FIND_LOBBY" => find_lobby::handle(self, &frame),
            "CREATE_LOBBY" => create_lobby::handle(self, &frame).await,
            "JOIN_LOBBY" => join_lobby::handle(self, &frame),
            "MANAGE_LOBBY" => manage_lobby::handle(self, &frame),
            other => {
                tracing::debug!(opcode = other, "unknown or unimplemented opcode");
                self.client
                    .send(crate::protocol::ServerFrame::new("WARNING", "unknown or unimplemented opcode"));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Context;
    use crate::auth::InMemoryTokenValidator;
    use crate::registry::{ClientHandle, Registry};
    use crate::relay::NullRelaySpawner;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// A context over a fresh registry with an unauthenticated client
    /// named `instance_id` in `game`. Auth is disabled, so any token in
    /// an `INIT` payload synthesizes a guest identity.
    pub(crate) fn context(game: &str, instance_id: &str) -> Context {
        context_in(&Arc::new(Registry::new()), game, instance_id)
    }

    /// Like [`context`], but joined to a registry shared with other
    /// contexts -- needed whenever a test has more than one peer in the
    /// same lobby.
    pub(crate) fn context_in(registry: &Arc<Registry>, game: &str, instance_id: &str) -> Context {
        let (tx, _rx) = mpsc::unbounded_channel();
        Context {
            registry: registry.clone(),
            relay_spawner: Arc::new(NullRelaySpawner),
            auth: Arc::new(InMemoryTokenValidator::disabled()),
            client: Arc::new(ClientHandle::new(
                instance_id.to_string(),
                game.to_string(),
                false,
                false,
                tx,
            )),
            keepalive_payload_len: 16,
        }
    }

    pub(crate) fn valid_context(game: &str, instance_id: &str) -> Context {
        valid_context_in(&Arc::new(Registry::new()), game, instance_id)
    }

    pub(crate) fn valid_context_in(registry: &Arc<Registry>, game: &str, instance_id: &str) -> Context {
        let ctx = context_in(registry, game, instance_id);
        ctx.client.authorize(
            format!("user_{instance_id}"),
            instance_id.to_string(),
            String::new(),
        );
        ctx
    }
}
