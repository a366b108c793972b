//! Break monitor lifecycle.
//!
//! The monitor cycles between two states for the whole life of its clock:
//! IDLE → RUNNING on activation, RUNNING → IDLE once the cooldown has
//! elapsed without a pause. Neither state is terminal.

use crate::error::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Break monitor states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorState {
    /// No monitor thread; `now()` reads the clock source directly.
    #[default]
    Idle,
    /// Busy-poll monitor thread is sampling the clock.
    Running,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Running => write!(f, "RUNNING"),
        }
    }
}

impl MonitorState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: MonitorState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Running) | (Self::Running, Self::Idle)
        )
    }

    /// Attempt to transition to `target`, returning error if invalid.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidStateTransition`] for a self-transition.
    pub fn transition_to(&mut self, target: MonitorState) -> ClockResult<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(ClockError::InvalidStateTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Returns true while a monitor thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Decode the flag stored in the clock's atomic.
    #[must_use]
    pub fn from_running_flag(running: bool) -> Self {
        if running {
            Self::Running
        } else {
            Self::Idle
        }
    }
}
