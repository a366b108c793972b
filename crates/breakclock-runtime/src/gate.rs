//! Activation gate.
//!
//! Starting the monitor and breaking into the debugger are separate
//! operations: [`BreakClock::ensure_monitor_started`] and
//! [`BreakClock::trigger_interactive_break`]. [`BreakClock::activate`]
//! composes them for call sites that want to stop right after making sure
//! the pause will be accounted for:
//!
//! ```ignore
//! clock.activate().fire();
//! ```

use crate::clock::BreakClock;
use crate::debugger::SharedDebugger;
use crate::monitor;
use breakclock_common::error::ClockResult;
use std::fmt;
use tracing::{debug, error};

/// Deferred interactive break returned by [`BreakClock::activate`].
///
/// Firing it is optional; the monitor is already running either way.
#[derive(Clone)]
pub enum BreakTrigger {
    /// No debugger attached. Firing does nothing.
    Noop,
    /// Fires the host interactive break.
    Host(SharedDebugger),
}

impl BreakTrigger {
    /// Stop at an interactive breakpoint, if a debugger was attached.
    pub fn fire(&self) {
        match self {
            Self::Noop => {}
            Self::Host(debugger) => debugger.interactive_break(),
        }
    }

    /// Returns true if firing has no effect.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

impl fmt::Debug for BreakTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => write!(f, "BreakTrigger::Noop"),
            Self::Host(_) => write!(f, "BreakTrigger::Host"),
        }
    }
}

impl BreakClock {
    /// Start the break monitor if a debugger is attached and none is running.
    ///
    /// Returns `Ok(true)` if this call spawned a monitor, `Ok(false)` if no
    /// debugger is attached or a monitor was already running.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Spawn`](breakclock_common::error::ClockError::Spawn)
    /// if the monitor thread cannot be created. The clock stays idle.
    pub fn ensure_monitor_started(&self) -> ClockResult<bool> {
        self.start_if_attached(self.shared.debugger.is_attached())
    }

    /// Break into the attached debugger. No-op without one.
    pub fn trigger_interactive_break(&self) {
        self.trigger_for(self.shared.debugger.is_attached()).fire();
    }

    /// Make sure the monitor is running and hand back the interactive break.
    ///
    /// The debugger is polled once; the same answer decides both whether the
    /// monitor starts and which trigger is returned. The trigger is never
    /// fired here. A failure to spawn the monitor is logged and the trigger
    /// is still returned.
    #[must_use = "activation only starts the monitor; call `fire()` to actually break"]
    pub fn activate(&self) -> BreakTrigger {
        let attached = self.shared.debugger.is_attached();
        if let Err(e) = self.start_if_attached(attached) {
            error!(error = %e, "Failed to start break monitor");
        }
        self.trigger_for(attached)
    }

    fn start_if_attached(&self, attached: bool) -> ClockResult<bool> {
        if !attached {
            debug!("No debugger attached, monitor not started");
            return Ok(false);
        }

        let mut slot = monitor::lock_slot(&self.shared.monitor);
        if slot.state.is_running() {
            return Ok(false);
        }
        monitor::spawn(&self.shared, &mut slot)?;
        Ok(true)
    }

    fn trigger_for(&self, attached: bool) -> BreakTrigger {
        if attached {
            BreakTrigger::Host(self.shared.debugger.clone())
        } else {
            BreakTrigger::Noop
        }
    }
}
