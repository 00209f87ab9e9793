//! Runtime lifecycle state machine

use serde::{Deserialize, Serialize};

/// Lifecycle states of the process-wide native runtime
///
/// The runtime is started at most once and torn down at most once:
/// ```text
/// Uninitialized → Initializing → Active → ShuttingDown → ShutDown
///                      │
///                      └──→ Failed
/// ```
/// There is no edge out of `ShutDown` or `Failed`; re-initialization is not
/// supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeState {
    /// Native engine has not been started
    #[default]
    Uninitialized,
    /// Native engine start is in progress
    Initializing,
    /// Native engine is running and accepting calls
    Active,
    /// Teardown is in progress
    ShuttingDown,
    /// Native engine has been torn down
    ShutDown,
    /// Native engine failed to start
    Failed,
}

impl RuntimeState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: RuntimeState) -> bool {
        use RuntimeState::*;
        matches!(
            (self, target),
            (Uninitialized, Initializing)
                | (Initializing, Active)
                | (Initializing, Failed)
                | (Active, ShuttingDown)
                | (ShuttingDown, ShutDown)
        )
    }

    /// Check if bridge calls may be issued in this state
    pub fn can_accept_calls(&self) -> bool {
        matches!(self, RuntimeState::Active)
    }

    /// Check if the runtime is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RuntimeState::ShutDown | RuntimeState::Failed)
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            RuntimeState::Uninitialized => "Native runtime has not been started",
            RuntimeState::Initializing => "Native runtime is starting",
            RuntimeState::Active => "Native runtime is active and accepting calls",
            RuntimeState::ShuttingDown => "Native runtime is shutting down",
            RuntimeState::ShutDown => "Native runtime has been shut down",
            RuntimeState::Failed => "Native runtime failed to start",
        }
    }
}

impl std::fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeState::Uninitialized => write!(f, "Uninitialized"),
            RuntimeState::Initializing => write!(f, "Initializing"),
            RuntimeState::Active => write!(f, "Active"),
            RuntimeState::ShuttingDown => write!(f, "ShuttingDown"),
            RuntimeState::ShutDown => write!(f, "ShutDown"),
            RuntimeState::Failed => write!(f, "Failed"),
        }
    }
}
