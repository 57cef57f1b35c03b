use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::protocol::ServerFrame;

/// Role in the state machine (spec.md §4.2). `Destroyed` is never stored --
/// it's the terminal value passed to `update_state` and observed only as
/// `last_state` for the duration of the destruction transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Destroyed,
    Uninitialized,
    Host,
    Member,
}

/// What's delivered to a client's dedicated writer task. Frames and the
/// close sequence share one channel so ordering between "last frame" and
/// "now close" is guaranteed without an extra handshake.
pub enum Outbound {
    Frame(ServerFrame),
    Close { opcode: &'static str, reason: String },
}

struct ClientInner {
    valid: bool,
    user_id: String,
    username: String,
    public_key: String,
    state: ClientState,
    last_state: ClientState,
    lobby: Option<String>,
}

/// A connected peer. Shared via `Arc` between the registry, the lobby it
/// occupies, and its own read loop; `inner` is the only mutable part and
/// is always locked together with the registry lock (spec.md §5).
pub struct ClientHandle {
    pub instance_id: String,
    pub game: String,
    pub token_was_present: bool,
    /// True when upgrade-time claims (the `token` query parameter,
    /// validated before `INIT`) already established identity, matching
    /// spec.md §3's `authedWithCookie`. `INIT` skips re-validating the
    /// token in that case.
    pub authed_with_cookie: bool,
    tx: mpsc::UnboundedSender<Outbound>,
    inner: Mutex<ClientInner>,
}

impl ClientHandle {
    pub fn new(
        instance_id: String,
        game: String,
        token_was_present: bool,
        authed_with_cookie: bool,
        tx: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            instance_id,
            game,
            token_was_present,
            authed_with_cookie,
            tx,
            inner: Mutex::new(ClientInner {
                valid: false,
                user_id: String::new(),
                username: String::new(),
                public_key: String::new(),
                state: ClientState::Uninitialized,
                last_state: ClientState::Uninitialized,
                lobby: None,
            }),
        }
    }

    /// Enqueue a frame on this client's writer task. Never blocks; a
    /// closed receiver (the client already disconnected) is reported as
    /// `false` so callers can skip further sends, matching the "one dead
    /// recipient doesn't affect the others" broadcast guarantee.
    pub fn send(&self, frame: ServerFrame) -> bool {
        self.tx.send(Outbound::Frame(frame)).is_ok()
    }

    /// Queue a close sequence: reason frame, then a control close. The
    /// actual socket teardown happens in the writer task once it drains
    /// the channel up to this entry.
    pub fn close(&self, opcode: &'static str, reason: impl Into<String>) {
        let _ = self.tx.send(Outbound::Close {
            opcode,
            reason: reason.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().unwrap().valid
    }

    pub fn state(&self) -> ClientState {
        self.inner.lock().unwrap().state
    }

    pub fn lobby_name(&self) -> Option<String> {
        self.inner.lock().unwrap().lobby.clone()
    }

    pub fn user_id(&self) -> String {
        self.inner.lock().unwrap().user_id.clone()
    }

    pub fn username(&self) -> String {
        self.inner.lock().unwrap().username.clone()
    }

    pub fn public_key(&self) -> String {
        self.inner.lock().unwrap().public_key.clone()
    }

    /// Applied by `INIT`: marks the client authorized and records its
    /// identity. Returns `false` if the client was already valid --
    /// callers reply `WARNING "already authorized"` in that case.
    pub fn authorize(&self, user_id: String, username: String, public_key: String) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.valid {
            return false;
        }
        inner.valid = true;
        inner.user_id = user_id;
        inner.username = username;
        inner.public_key = public_key;
        true
    }

    /// Records identity recovered from upgrade-time claims, ahead of
    /// `INIT` -- leaves `valid` false; `INIT` still runs to completion
    /// and sends `INIT_OK`, it just skips re-validating the token.
    pub(crate) fn set_identity(&self, user_id: String, username: String) {
        let mut inner = self.inner.lock().unwrap();
        inner.user_id = user_id;
        inner.username = username;
    }

    /// Only ever called by the state machine, which owns the registry
    /// lock for the duration of the transition.
    pub(crate) fn set_state_locked(&self, new_state: ClientState, lobby: Option<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.last_state = inner.state;
        inner.state = new_state;
        inner.lobby = lobby;
    }

    pub(crate) fn last_state(&self) -> ClientState {
        self.inner.lock().unwrap().last_state
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("instance_id", &self.instance_id)
            .field("game", &self.game)
            .finish_non_exhaustive()
    }
}
