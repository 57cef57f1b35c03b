//! The media relay is a black-box collaborator: it's spawned opaquely by
//! id and torn down through a two-step rendezvous, but this crate never
//! looks inside it (spec.md §1, §4.3, §6). The real implementation is a
//! PeerJS-compatible relay peer (`examples/original_source/pkg/signaling/relay`);
//! nothing in this crate depends on that library directly.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay spawn failed: {0}")]
    SpawnFailed(String),
}

/// Handle to a running relay. Dropping it without calling
/// [`RelayHandle::shutdown`] abandons the relay task -- callers always go
/// through `shutdown` during lobby destruction (spec.md §4.2).
pub struct RelayHandle {
    pub id: String,
    request_shutdown: Option<oneshot::Sender<()>>,
    await_shutdown_complete: Option<oneshot::Receiver<()>>,
}

impl RelayHandle {
    /// Signals the relay to stop and blocks until it confirms teardown.
    /// Called while the registry lock is held, matching the original's
    /// `Close <- true; <-CloseDone` rendezvous -- an accepted suspension
    /// point (spec.md §5).
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.request_shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(rx) = self.await_shutdown_complete.take() {
            let _ = rx.await;
        }
    }
}

/// Spawns and owns the lifecycle of a per-lobby relay. Implementations
/// are free to run the relay peer on whatever executor/library they
/// like; this crate only ever sees the `id` and the shutdown rendezvous.
#[async_trait::async_trait]
pub trait RelaySpawner: Send + Sync {
    async fn spawn(&self, game: &str, lobby: &str) -> Result<RelayHandle, RelayError>;
}

/// Default spawner for a deployment with no relay backend configured:
/// every spawn fails, and `CREATE_LOBBY` silently downgrades to
/// `relay_enabled = false` per spec.md §4.3.
pub struct NullRelaySpawner;

#[async_trait::async_trait]
impl RelaySpawner for NullRelaySpawner {
    async fn spawn(&self, _game: &str, _lobby: &str) -> Result<RelayHandle, RelayError> {
        Err(RelayError::SpawnFailed("no relay backend configured".into()))
    }
}

/// Test spawner: a relay that immediately exists and tears down as soon
/// as `shutdown` is called, with no actual transport behind it.
pub struct LoopbackRelaySpawner;

#[async_trait::async_trait]
impl RelaySpawner for LoopbackRelaySpawner {
    async fn spawn(&self, _game: &str, _lobby: &str) -> Result<RelayHandle, RelayError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = shutdown_rx.await;
            let _ = done_tx.send(());
        });
        Ok(RelayHandle {
            id: Uuid::new_v4().to_string(),
            request_shutdown: Some(shutdown_tx),
            await_shutdown_complete: Some(done_rx),
        })
    }
}

pub type SharedRelaySpawner = Arc<dyn RelaySpawner>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_spawner_completes_shutdown() {
        let spawner = LoopbackRelaySpawner;
        let mut handle = spawner.spawn("g1", "x").await.unwrap();
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn null_spawner_always_fails() {
        let spawner = NullRelaySpawner;
        assert!(spawner.spawn("g1", "x").await.is_err());
    }
}
