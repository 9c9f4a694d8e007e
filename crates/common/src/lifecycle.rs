//! Subsystem lifecycle tracking
//!
//! Each subsystem moves `Uninitialized → Initializing → Ready | Failed`.
//! Nothing leaves `Failed` on its own; the owner re-runs its initializer.

use serde::Serialize;
use std::fmt;
use tokio::sync::RwLock;

/// Current state of one subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubsystemState {
    Uninitialized,
    Initializing,
    Ready,
    Failed { reason: String },
}

impl SubsystemState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SubsystemState::Ready)
    }
}

impl fmt::Display for SubsystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsystemState::Uninitialized => write!(f, "uninitialized"),
            SubsystemState::Initializing => write!(f, "initializing"),
            SubsystemState::Ready => write!(f, "ready"),
            SubsystemState::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// State cell shared by a subsystem's operations
pub struct Lifecycle {
    name: &'static str,
    state: RwLock<SubsystemState>,
}

impl Lifecycle {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(SubsystemState::Uninitialized),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn current(&self) -> SubsystemState {
        self.state.read().await.clone()
    }

    pub async fn is_ready(&self) -> bool {
        self.state.read().await.is_ready()
    }

    pub async fn transition(&self, next: SubsystemState) {
        let mut state = self.state.write().await;
        if *state != next {
            let from = state.to_string();
            tracing::info!(
                subsystem = self.name,
                from = %from,
                to = %next,
                "Lifecycle transition"
            );
        }
        *state = next;
    }

    pub async fn fail(&self, reason: impl Into<String>) {
        self.transition(SubsystemState::Failed {
            reason: reason.into(),
        })
        .await;
    }
}

/// Readiness of both subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub semantic_index_ready: bool,
    pub graph_ready: bool,
}

impl Readiness {
    /// Overall readiness: both subsystems must be ready
    pub fn is_ready(&self) -> bool {
        self.semantic_index_ready && self.graph_ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_uninitialized() {
        let lifecycle = Lifecycle::new("graph");
        assert_eq!(lifecycle.current().await, SubsystemState::Uninitialized);
        assert!(!lifecycle.is_ready().await);
    }

    #[tokio::test]
    async fn test_failed_is_sticky_until_rerun() {
        let lifecycle = Lifecycle::new("graph");
        lifecycle.transition(SubsystemState::Initializing).await;
        lifecycle.fail("connection refused").await;
        assert!(matches!(lifecycle.current().await, SubsystemState::Failed { .. }));

        lifecycle.transition(SubsystemState::Initializing).await;
        lifecycle.transition(SubsystemState::Ready).await;
        assert!(lifecycle.is_ready().await);
    }

    #[test]
    fn test_readiness_is_conjunction() {
        let both = Readiness {
            semantic_index_ready: true,
            graph_ready: true,
        };
        let one = Readiness {
            semantic_index_ready: true,
            graph_ready: false,
        };
        assert!(both.is_ready());
        assert!(!one.is_ready());
    }
}
