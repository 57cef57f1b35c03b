use std::sync::{Arc, Mutex};

use super::client::ClientHandle;

pub struct LobbyMutable {
    pub host: Option<Arc<ClientHandle>>,
    pub members: Vec<Arc<ClientHandle>>,
    pub password: String,
    pub max_players: i64,
    pub locked: bool,
    pub relay_enabled: bool,
    pub relay_id: Option<String>,
}

/// A named lobby within a game. `mutable` is locked together with the
/// registry lock for any operation that also touches the registry's
/// uninitialized-peer bookkeeping (host reassignment, destruction);
/// read-only queries (`FIND_LOBBY`, `LIST_LOBBIES`) only need the
/// registry's read guard plus this lock.
pub struct Lobby {
    pub name: String,
    pub game: String,
    pub mutable: Mutex<LobbyMutable>,
}

impl Lobby {
    pub fn new(
        name: String,
        game: String,
        password: String,
        max_players: i64,
        locked: bool,
        relay_enabled: bool,
    ) -> Self {
        Self {
            name,
            game,
            mutable: Mutex::new(LobbyMutable {
                host: None,
                members: Vec::new(),
                password,
                max_players,
                locked,
                relay_enabled,
                relay_id: None,
            }),
        }
    }

    pub fn member_count(&self) -> usize {
        self.mutable.lock().unwrap().members.len()
    }

    pub fn has_room(&self) -> bool {
        let inner = self.mutable.lock().unwrap();
        inner.max_players == -1 || (inner.members.len() as i64) < inner.max_players
    }

    /// `members` plus the host, excluding `exclude`. Used to build
    /// broadcast recipient lists (spec.md §4.4).
    pub fn everyone_except(&self, exclude: &str) -> Vec<Arc<ClientHandle>> {
        let inner = self.mutable.lock().unwrap();
        inner
            .host
            .iter()
            .cloned()
            .chain(inner.members.iter().cloned())
            .filter(|c| c.instance_id != exclude)
            .collect()
    }

    /// `members` only, excluding `exclude` -- the host is never a
    /// recipient (it gets its own explicit frame at the call site, e.g.
    /// `JOIN_LOBBY`'s `NEW_PEER`). Used where spec.md says "all members"
    /// rather than "host and members".
    pub fn members_except(&self, exclude: &str) -> Vec<Arc<ClientHandle>> {
        let inner = self.mutable.lock().unwrap();
        inner
            .members
            .iter()
            .filter(|c| c.instance_id != exclude)
            .cloned()
            .collect()
    }

    pub fn is_empty_of_participants(&self) -> bool {
        let inner = self.mutable.lock().unwrap();
        inner.host.is_none() && inner.members.is_empty()
    }
}

/// Append `client` to a list unless it's already present.
pub(crate) fn and(list: &mut Vec<Arc<ClientHandle>>, client: Arc<ClientHandle>) {
    if !list.iter().any(|c| c.instance_id == client.instance_id) {
        list.push(client);
    }
}

/// Find a member by instance id (spec.md's `Get`).
pub(crate) fn find<'a>(
    list: &'a [Arc<ClientHandle>],
    instance_id: &str,
) -> Option<&'a Arc<ClientHandle>> {
    list.iter().find(|c| c.instance_id == instance_id)
}
