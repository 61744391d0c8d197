//! Worker lifecycle state machine
//!
//! | State | Intercepts | Left by |
//! |-------|------------|---------|
//! | Installing | no | install settled / failed |
//! | Waiting | no | activate |
//! | Activating | no | activation settled / failed |
//! | Activated | yes | superseded |
//! | Redundant | no | terminal |

use crate::error::{KioskError, KioskResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    /// Installed, waiting for the previous version to let go
    Waiting,
    Activating,
    Activated,
    /// Replaced by a newer version or failed to install/activate
    Redundant,
}

/// Inputs that move a worker between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// All install sub-operations settled
    InstallSettled,
    /// The store could not be opened at all
    InstallFailed,
    Activate,
    ActivationSettled,
    ActivationFailed,
    /// A newer version took over
    Superseded,
}

impl WorkerState {
    /// Apply `event`, returning the next state
    pub fn on(self, event: LifecycleEvent) -> KioskResult<WorkerState> {
        use LifecycleEvent::*;
        use WorkerState::*;

        let next = match (self, event) {
            (Installing, InstallSettled) => Waiting,
            (Installing, InstallFailed) => Redundant,
            (Waiting, Activate) => Activating,
            (Activating, ActivationSettled) => Activated,
            (Activating, ActivationFailed) => Redundant,
            (Redundant, _) => {
                return Err(KioskError::InvalidTransition { state: self, event })
            }
            (_, Superseded) => Redundant,
            _ => return Err(KioskError::InvalidTransition { state: self, event }),
        };
        Ok(next)
    }

    /// Whether this state allows fetch interception
    pub fn can_intercept(&self) -> bool {
        matches!(self, Self::Activated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redundant)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Waiting => write!(f, "waiting"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}
