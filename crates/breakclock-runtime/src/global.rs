//! Process-wide break clock.
//!
//! Most applications want one clock shared by every thread. [`install`]
//! sets it up from configuration once, before first use; if nothing is
//! installed, the first call to any function here installs a clock with the
//! default configuration.

use crate::clock::BreakClock;
use crate::gate::BreakTrigger;
use crate::watcher::WatcherHandle;
use breakclock_common::config::ClockConfig;
use breakclock_common::error::{ClockError, ClockResult};
use breakclock_common::time::Timestamp;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::warn;

static GLOBAL: OnceLock<BreakClock> = OnceLock::new();

/// Install the process-wide clock built from `config`.
///
/// Starts the auto-start watcher afterwards when the config enables it.
///
/// # Errors
///
/// [`ClockError::AlreadyInstalled`] if a clock is already installed (also
/// when one was created implicitly by an earlier call), or any error from
/// building the clock.
pub fn install(config: ClockConfig) -> ClockResult<&'static BreakClock> {
    let auto_start = config.auto_start.clone();
    let mut config = config;
    config.auto_start.enabled = false;

    let clock = install_clock(BreakClock::from_config(config)?)?;
    if auto_start.enabled {
        clock.start_auto_watcher(auto_start.poll_interval)?;
    }
    Ok(clock)
}

/// Install an already built clock as the process-wide clock.
///
/// # Errors
///
/// [`ClockError::AlreadyInstalled`] if a clock is already installed.
pub fn install_clock(clock: BreakClock) -> ClockResult<&'static BreakClock> {
    GLOBAL
        .set(clock)
        .map_err(|_| ClockError::AlreadyInstalled)?;
    GLOBAL.get().ok_or(ClockError::AlreadyInstalled)
}

/// The process-wide clock, installing a default one if needed.
pub fn clock() -> &'static BreakClock {
    GLOBAL.get_or_init(|| {
        BreakClock::from_config(ClockConfig::default()).unwrap_or_else(|e| {
            warn!(error = %e, "Default break clock rejected, using unvalidated defaults");
            BreakClock::unchecked(ClockConfig::default())
        })
    })
}

/// Whether a process-wide clock has been installed.
pub fn is_installed() -> bool {
    GLOBAL.get().is_some()
}

/// Virtual time of the process-wide clock.
pub fn now() -> Timestamp {
    clock().now()
}

/// Accumulated pause time of the process-wide clock.
pub fn pause_time() -> Duration {
    clock().pause_time()
}

/// Start the monitor (if a debugger is attached) and return the break.
pub fn activate() -> BreakTrigger {
    clock().activate()
}

/// Start the monitor if a debugger is attached and none is running.
///
/// # Errors
///
/// See [`BreakClock::ensure_monitor_started`].
pub fn ensure_monitor_started() -> ClockResult<bool> {
    clock().ensure_monitor_started()
}

/// Break into the attached debugger, if any.
pub fn trigger_interactive_break() {
    clock().trigger_interactive_break();
}

/// Start the process-wide auto-start watcher.
///
/// # Errors
///
/// See [`BreakClock::start_auto_watcher`].
pub fn start_auto_watcher(poll_interval: Duration) -> ClockResult<WatcherHandle> {
    clock().start_auto_watcher(poll_interval)
}
