//! Process-wide bookkeeping: which clients exist per game, which lobbies
//! are open, and which uninitialized (valid but lobby-less) peers should
//! hear about lobby creation/closure (spec.md §3, §4.1).
//!
//! `Registry` is the "registry-wide single writer lock" of spec.md §5: a
//! single `RwLock` guards the per-game maps. Lobby membership itself
//! lives behind each [`Lobby`]'s own mutex so read-only queries don't
//! need to block on an unrelated lobby's churn.

pub mod client;
pub mod lobby;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

pub use client::{ClientHandle, ClientState, Outbound};
pub use lobby::{Lobby, LobbyMutable};

use crate::relay::RelayHandle;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("session already in use for this game")]
    DuplicateInstance,
}

#[derive(Default)]
pub struct GameState {
    pub uninitialized: HashMap<String, Arc<ClientHandle>>,
    pub lobbies: HashMap<String, Arc<Lobby>>,
    pub relays: HashMap<String, RelayHandle>,
    pub global_peer_ids: HashSet<String>,
}

#[derive(Default)]
pub struct Registry {
    games: RwLock<HashMap<String, GameState>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly-upgraded connection under its game, rejecting a
    /// second connection that reuses the same instance id (spec.md §9's
    /// supplemented duplicate-session check).
    pub fn register_client(
        &self,
        client: Arc<ClientHandle>,
    ) -> Result<(), RegistryError> {
        let mut games = self.games.write().unwrap();
        let game = games.entry(client.game.clone()).or_default();
        if !game.global_peer_ids.insert(client.instance_id.clone()) {
            return Err(RegistryError::DuplicateInstance);
        }
        game.uninitialized
            .insert(client.instance_id.clone(), client);
        Ok(())
    }

    pub fn list_lobbies(&self, game: &str) -> Vec<String> {
        let games = self.games.read().unwrap();
        games
            .get(game)
            .map(|g| g.lobbies.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn find_lobby(&self, game: &str, name: &str) -> Option<Arc<Lobby>> {
        let games = self.games.read().unwrap();
        games.get(game)?.lobbies.get(name).cloned()
    }

    /// Creates and inserts a new lobby, or returns `None` if one with the
    /// same name already exists in this game (spec.md §4.3 `CREATE_LOBBY`).
    pub fn create_lobby(
        &self,
        game: &str,
        name: &str,
        password: String,
        max_players: i64,
        locked: bool,
        relay_enabled: bool,
    ) -> Option<Arc<Lobby>> {
        let mut games = self.games.write().unwrap();
        let state = games.entry(game.to_string()).or_default();
        if state.lobbies.contains_key(name) {
            return None;
        }
        let lobby = Arc::new(Lobby::new(
            name.to_string(),
            game.to_string(),
            password,
            max_players,
            locked,
            relay_enabled,
        ));
        state.lobbies.insert(name.to_string(), lobby.clone());
        Some(lobby)
    }

    pub fn uninitialized_peers(&self, game: &str) -> Vec<Arc<ClientHandle>> {
        let games = self.games.read().unwrap();
        games
            .get(game)
            .map(|g| g.uninitialized.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn mark_uninitialized(&self, client: &Arc<ClientHandle>) {
        let mut games = self.games.write().unwrap();
        let state = games.entry(client.game.clone()).or_default();
        state
            .uninitialized
            .insert(client.instance_id.clone(), client.clone());
    }

    pub fn unmark_uninitialized(&self, game: &str, instance_id: &str) {
        let mut games = self.games.write().unwrap();
        if let Some(state) = games.get_mut(game) {
            state.uninitialized.remove(instance_id);
        }
    }

    pub fn remove_lobby(&self, game: &str, name: &str) -> Option<Arc<Lobby>> {
        let mut games = self.games.write().unwrap();
        games.get_mut(game)?.lobbies.remove(name)
    }

    pub fn insert_relay(&self, game: &str, lobby: &str, handle: RelayHandle) {
        let mut games = self.games.write().unwrap();
        games
            .entry(game.to_string())
            .or_default()
            .relays
            .insert(lobby.to_string(), handle);
    }

    pub fn take_relay(&self, game: &str, lobby: &str) -> Option<RelayHandle> {
        let mut games = self.games.write().unwrap();
        games.get_mut(game)?.relays.remove(lobby)
    }

    /// Drops bookkeeping for a game once nothing references it anymore
    /// (spec.md §4.1's `TriggerCleanup`).
    pub fn collect_garbage(&self, game: &str) {
        let mut games = self.games.write().unwrap();
        let empty = games
            .get(game)
            .map(|g| g.uninitialized.is_empty() && g.lobbies.is_empty() && g.relays.is_empty())
            .unwrap_or(false);
        if empty {
            games.remove(game);
            tracing::info!(game, "game bookkeeping collected");
        }
    }

    pub fn forget_client(&self, game: &str, instance_id: &str) {
        let mut games = self.games.write().unwrap();
        if let Some(state) = games.get_mut(game) {
            state.uninitialized.remove(instance_id);
            state.global_peer_ids.remove(instance_id);
        }
    }

    pub fn has_instance(&self, game: &str, instance_id: &str) -> bool {
        let games = self.games.read().unwrap();
        games
            .get(game)
            .map(|g| g.global_peer_ids.contains(instance_id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_client(game: &str, id: &str) -> Arc<ClientHandle> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(ClientHandle::new(id.to_string(), game.to_string(), false, false, tx))
    }

    #[test]
    fn rejects_duplicate_instance_id() {
        let registry = Registry::new();
        let a = test_client("g1", "dup");
        let b = test_client("g1", "dup");
        assert!(registry.register_client(a).is_ok());
        assert!(matches!(
            registry.register_client(b),
            Err(RegistryError::DuplicateInstance)
        ));
    }

    #[test]
    fn create_lobby_rejects_existing_name() {
        let registry = Registry::new();
        assert!(registry
            .create_lobby("g1", "x", String::new(), -1, false, false)
            .is_some());
        assert!(registry
            .create_lobby("g1", "x", String::new(), -1, false, false)
            .is_none());
    }

    #[test]
    fn garbage_collection_drops_empty_game() {
        let registry = Registry::new();
        let client = test_client("g1", "a");
        registry.register_client(client.clone()).unwrap();
        registry.unmark_uninitialized("g1", "a");
        registry.forget_client("g1", "a");
        registry.collect_garbage("g1");
        assert!(registry.list_lobbies("g1").is_empty());
        assert!(!registry.has_instance("g1", "a"));
    }
}
