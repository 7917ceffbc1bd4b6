//! Player state management

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sequence player state
///
/// `Stopped`, `Finished`, and `Failed` are terminal; a new run may be started
/// from `Idle` or any terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Idle,
    Running,
    Paused,
    Stopping,
    Stopped,
    Finished,
    Failed { reason: String },
}

impl PlayerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerState::Stopped | PlayerState::Finished | PlayerState::Failed { .. }
        )
    }

    /// Whether `start` is accepted in this state
    pub fn can_start(&self) -> bool {
        matches!(self, PlayerState::Idle) || self.is_terminal()
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "idle"),
            PlayerState::Running => write!(f, "running"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Stopping => write!(f, "stopping"),
            PlayerState::Stopped => write!(f, "stopped"),
            PlayerState::Finished => write!(f, "finished"),
            PlayerState::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Shared player state
///
/// Mutated by both the controlling context and the run task, so all access
/// goes through the lock; the loop observes control-side changes at its next
/// poll point.
#[derive(Debug, Clone)]
pub struct SharedPlayerState {
    inner: Arc<RwLock<PlayerState>>,
}

impl SharedPlayerState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(PlayerState::Idle)),
        }
    }

    pub async fn get(&self) -> PlayerState {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, state: PlayerState) {
        *self.inner.write().await = state;
    }

    /// Atomically move `Running`/`Paused` to `Stopping`
    ///
    /// Returns false when no run is in flight (or it already reached a
    /// terminal state), so a losing `stop` call cannot clobber `Finished` or
    /// `Failed`.
    pub async fn begin_stop(&self) -> bool {
        let mut state = self.inner.write().await;
        match *state {
            PlayerState::Running | PlayerState::Paused => {
                *state = PlayerState::Stopping;
                true
            }
            _ => false,
        }
    }
}

impl Default for SharedPlayerState {
    fn default() -> Self {
        Self::new()
    }
}
