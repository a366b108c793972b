//! Auto-start watcher.
//!
//! Starts the break monitor without instrumenting every breakpoint site.
//! A background thread sleeps for the poll interval and compares how far
//! the virtual clock moved in the meantime. When a debugger stops the
//! process, the sleep overruns and the virtual clock jumps by more than the
//! tolerance (twice the poll interval); the watcher then starts the monitor
//! so the remainder of the pause is accounted for.
//!
//! The watcher runs for the lifetime of the process. It can be started once
//! per clock and has no stop operation.

use crate::clock::BreakClock;
use breakclock_common::error::{ClockError, ClockResult};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the watcher thread.
pub const WATCHER_THREAD_NAME: &str = "break-watcher";

/// Handle to the auto-start watcher thread.
#[derive(Debug)]
pub struct WatcherHandle {
    thread: thread::Thread,
    poll_interval: Duration,
}

impl WatcherHandle {
    /// Sleep between two drift observations.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Drift above which the monitor is started.
    #[must_use]
    pub fn tolerance(&self) -> Duration {
        tolerance(self.poll_interval)
    }

    /// The watcher's thread.
    #[must_use]
    pub fn thread(&self) -> &thread::Thread {
        &self.thread
    }
}

fn tolerance(poll_interval: Duration) -> Duration {
    poll_interval * 2
}

impl BreakClock {
    /// Start the auto-start watcher.
    ///
    /// # Errors
    ///
    /// - [`ClockError::Config`] if `poll_interval` is zero.
    /// - [`ClockError::WatcherAlreadyStarted`] if a watcher was already
    ///   started for this clock. The running watcher is unaffected.
    /// - [`ClockError::Spawn`] if the thread cannot be created; a later
    ///   call may retry.
    pub fn start_auto_watcher(&self, poll_interval: Duration) -> ClockResult<WatcherHandle> {
        if poll_interval.is_zero() {
            return Err(ClockError::Config(
                "auto-start poll interval must be non-zero".into(),
            ));
        }

        if self
            .shared
            .watcher_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClockError::WatcherAlreadyStarted);
        }

        info!(
            poll_ms = poll_interval.as_millis(),
            tolerance_ms = tolerance(poll_interval).as_millis(),
            "Starting auto-start watcher"
        );

        let clock = self.clone();
        let handle = match thread::Builder::new()
            .name(WATCHER_THREAD_NAME.into())
            .spawn(move || watch(&clock, poll_interval))
        {
            Ok(h) => h,
            Err(e) => {
                // Reset the flag on spawn failure
                self.shared.watcher_started.store(false, Ordering::Release);
                return Err(ClockError::Spawn {
                    thread: WATCHER_THREAD_NAME.into(),
                    reason: e.to_string(),
                });
            }
        };

        Ok(WatcherHandle {
            thread: handle.thread().clone(),
            poll_interval,
        })
    }

    /// Whether the auto-start watcher has been started for this clock.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.shared.watcher_started.load(Ordering::Acquire)
    }
}

/// Watcher thread body. Never returns.
fn watch(clock: &BreakClock, poll_interval: Duration) {
    let tolerance = tolerance(poll_interval);
    let mut last_observed = clock.now();
    debug!("Auto-start watcher thread started");

    loop {
        thread::sleep(poll_interval);

        let elapsed = clock.now().saturating_duration_since(last_observed);
        if elapsed > tolerance && !clock.is_monitoring() {
            debug!(
                elapsed_ms = elapsed.as_millis(),
                tolerance_ms = tolerance.as_millis(),
                "Clock drift detected"
            );
            match clock.ensure_monitor_started() {
                Ok(true) => clock.shared.counters.record_watcher_activation(),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Auto-start watcher could not start monitor"),
            }
        }

        last_observed = clock.now();
    }
}
