//! Process lifecycle state machine — `Uninitialized -> Initializing ->
//! Running -> Stopping -> Stopped`, grounded in `solver_core::lifecycle::
//! LifecycleManager`. Distinct from [`speedrun_lifecycle::LifecycleEngine`],
//! which folds decoded events into intent state; this one just tracks
//! where the process itself is in its own startup/shutdown sequence.

use crate::error::CoreError;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Running,
    Stopping,
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

pub struct LifecycleManager {
    state: RwLock<LifecycleState>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self { state: RwLock::new(LifecycleState::Uninitialized) }
    }

    pub async fn get_state(&self) -> LifecycleState {
        *self.state.read().await
    }

    pub async fn transition(&self, to: LifecycleState) -> Result<(), CoreError> {
        let mut state = self.state.write().await;
        let from = *state;
        if !is_valid_transition(from, to) {
            return Err(CoreError::InvalidTransition { from: from.to_string(), to: to.to_string() });
        }
        info!(%from, %to, "orchestrator lifecycle transition");
        *state = to;
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
    use LifecycleState::*;
    matches!(
        (from, to),
        (Uninitialized, Initializing) | (Initializing, Running) | (Running, Stopping) | (Stopping, Stopped)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn follows_the_happy_path() {
        let manager = LifecycleManager::new();
        manager.transition(LifecycleState::Initializing).await.unwrap();
        manager.transition(LifecycleState::Running).await.unwrap();
        manager.transition(LifecycleState::Stopping).await.unwrap();
        manager.transition(LifecycleState::Stopped).await.unwrap();
        assert_eq!(manager.get_state().await, LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn rejects_skipping_a_state() {
        let manager = LifecycleManager::new();
        let err = manager.transition(LifecycleState::Running).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }
}
