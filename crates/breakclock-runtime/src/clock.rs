//! The virtual clock.
//!
//! [`BreakClock`] owns the pause bookkeeping and hands out corrected
//! timestamps. It is cheap to clone; all clones share one state.
//!
//! # Threading Model
//!
//! - **Monitor thread**: sole writer of the pause total, the recent-run
//!   accumulator, and the last sample while it is alive.
//! - **Any thread**: reads `now()` / `pause_time()` without locking. Values
//!   may be slightly stale.
//! - **Activation**: the monitor handle is swapped under a single mutex so
//!   at most one monitor thread exists per clock.

use crate::clock_source::{SharedClockSource, SystemClock};
use crate::debugger::{debugger_for_mode, SharedDebugger};
use crate::monitor::MonitorSlot;
use breakclock_common::config::ClockConfig;
use breakclock_common::error::ClockResult;
use breakclock_common::state::MonitorState;
use breakclock_common::stats::{MonitorStats, PauseCounters};
use breakclock_common::time::{duration_to_nanos, Timestamp};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Virtual wall clock with debugger pause time subtracted.
#[derive(Debug, Clone)]
pub struct BreakClock {
    pub(crate) shared: Arc<ClockShared>,
}

/// State shared between the clock, its monitor thread, and its watcher.
#[derive(Debug)]
pub(crate) struct ClockShared {
    pub(crate) config: ClockConfig,
    pub(crate) source: SharedClockSource,
    pub(crate) debugger: SharedDebugger,

    /// Accumulated pause time in nanoseconds. Never decreases.
    pub(crate) pause_ns: CachePadded<AtomicU64>,
    /// Recent normal-execution accumulator in nanoseconds.
    pub(crate) recent_run_ns: CachePadded<AtomicU64>,
    /// Raw timestamp of the monitor's latest sample.
    pub(crate) last_sample_ns: CachePadded<AtomicU64>,
    /// Mirrors `monitor.state` for lock-free readers.
    pub(crate) running: AtomicBool,

    pub(crate) monitor: Mutex<MonitorSlot>,
    pub(crate) watcher_started: AtomicBool,
    pub(crate) counters: PauseCounters,
}

impl ClockShared {
    #[inline]
    pub(crate) fn pause(&self) -> Duration {
        Duration::from_nanos(self.pause_ns.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn now(&self) -> Timestamp {
        if self.is_running() {
            // Acquire pairs with the monitor's release store so the pause
            // read below is at least as new as this sample.
            let last = Timestamp::from_nanos(self.last_sample_ns.load(Ordering::Acquire));
            last.saturating_sub(self.pause())
        } else {
            let raw = self.source.now();
            raw.saturating_sub(self.pause())
        }
    }

    /// Publish one monitor sample.
    #[inline]
    pub(crate) fn publish(&self, pause: Duration, recent_run: Duration, last_sample: Timestamp) {
        self.pause_ns.store(duration_to_nanos(pause), Ordering::Relaxed);
        self.recent_run_ns.store(duration_to_nanos(recent_run), Ordering::Relaxed);
        self.last_sample_ns.store(last_sample.as_nanos(), Ordering::Release);
    }
}

impl BreakClock {
    /// Default sources without validation or watcher start.
    pub(crate) fn unchecked(config: ClockConfig) -> Self {
        let debugger = debugger_for_mode(config.debugger);
        Self::assemble(config, Arc::new(SystemClock::new()), debugger)
    }

    fn assemble(config: ClockConfig, source: SharedClockSource, debugger: SharedDebugger) -> Self {
        let start = source.now();
        Self {
            shared: Arc::new(ClockShared {
                config,
                source,
                debugger,
                pause_ns: CachePadded::new(AtomicU64::new(0)),
                recent_run_ns: CachePadded::new(AtomicU64::new(0)),
                last_sample_ns: CachePadded::new(AtomicU64::new(start.as_nanos())),
                running: AtomicBool::new(false),
                monitor: Mutex::new(MonitorSlot::default()),
                watcher_started: AtomicBool::new(false),
                counters: PauseCounters::new(),
            }),
        }
    }

    /// Start building a clock.
    #[must_use]
    pub fn builder() -> BreakClockBuilder {
        BreakClockBuilder::new()
    }

    /// Build a clock from configuration using the system clock and the
    /// debugger host selected by `config.debugger`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the auto-start
    /// watcher cannot be spawned.
    pub fn from_config(config: ClockConfig) -> ClockResult<Self> {
        Self::builder().config(config).build()
    }

    /// Current virtual time.
    ///
    /// While idle this is the raw source time minus the accumulated pause.
    /// While the monitor runs it is the monitor's last sample minus the
    /// pause, so a caller that was itself stopped at a breakpoint does not
    /// see the raw time that jumped forward during its own pause.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.shared.now()
    }

    /// Accumulated time attributed to debugger pauses.
    #[must_use]
    pub fn pause_time(&self) -> Duration {
        self.shared.pause()
    }

    /// Raw time from the underlying source, uncorrected.
    #[must_use]
    pub fn raw_now(&self) -> Timestamp {
        self.shared.source.now()
    }

    /// Whether a monitor thread is currently sampling.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.shared.is_running()
    }

    /// Current monitor state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        MonitorState::from_running_flag(self.is_monitoring())
    }

    /// Recent normal-execution accumulator of the current session.
    #[must_use]
    pub fn recent_run(&self) -> Duration {
        Duration::from_nanos(self.shared.recent_run_ns.load(Ordering::Relaxed))
    }

    /// Raw timestamp of the monitor's latest sample.
    #[must_use]
    pub fn last_sample(&self) -> Timestamp {
        Timestamp::from_nanos(self.shared.last_sample_ns.load(Ordering::Acquire))
    }

    /// Configuration this clock was built with.
    #[must_use]
    pub fn config(&self) -> &ClockConfig {
        &self.shared.config
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        self.shared.counters.snapshot(self.pause_time())
    }

    /// Whether the debugger host reports an attached debugger.
    #[must_use]
    pub fn debugger_attached(&self) -> bool {
        self.shared.debugger.is_attached()
    }
}

/// Builder for [`BreakClock`].
#[derive(Debug, Default)]
pub struct BreakClockBuilder {
    config: ClockConfig,
    source: Option<SharedClockSource>,
    debugger: Option<SharedDebugger>,
}

impl BreakClockBuilder {
    /// Create a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: ClockConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the cooldown.
    #[must_use]
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    /// Override the loop-check threshold.
    #[must_use]
    pub fn loop_check_threshold(mut self, threshold: Duration) -> Self {
        self.config.loop_check_threshold = threshold;
        self
    }

    /// Inject a clock source. Defaults to [`SystemClock`].
    #[must_use]
    pub fn source(mut self, source: SharedClockSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Inject a debugger host. Defaults to the one named by the config.
    #[must_use]
    pub fn debugger(mut self, debugger: SharedDebugger) -> Self {
        self.debugger = Some(debugger);
        self
    }

    /// Validate the configuration and build the clock.
    ///
    /// Starts the auto-start watcher when `config.auto_start.enabled` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the watcher thread
    /// cannot be spawned.
    pub fn build(self) -> ClockResult<BreakClock> {
        self.config.validate()?;

        let source = self.source.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let debugger = self
            .debugger
            .unwrap_or_else(|| debugger_for_mode(self.config.debugger));
        info!(
            source = source.name(),
            cooldown_ms = self.config.cooldown.as_millis(),
            threshold_us = self.config.loop_check_threshold.as_micros(),
            "Break clock created"
        );

        let auto_start = self.config.auto_start.clone();
        let clock = BreakClock::assemble(self.config, source, debugger);

        if auto_start.enabled {
            clock.start_auto_watcher(auto_start.poll_interval)?;
        }

        Ok(clock)
    }
}
