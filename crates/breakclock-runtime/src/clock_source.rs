//! Wall-clock sources.
//!
//! The break clock never reads the system time directly. It goes through a
//! [`ClockSource`] so the pause heuristic can be driven by a deterministic
//! [`SimulatedClock`] in tests.

use breakclock_common::time::{duration_to_nanos, Timestamp};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Source of raw wall-clock timestamps.
pub trait ClockSource: Debug + Send + Sync + 'static {
    /// Current raw time according to this source.
    fn now(&self) -> Timestamp;

    /// Name used in log output.
    fn name(&self) -> &str {
        "ClockSource"
    }
}

/// Thread-safe clock source shared between the monitor, the watcher, and readers.
pub type SharedClockSource = Arc<dyn ClockSource>;

/// Real system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ClockSource for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

/// Deterministic clock for tests.
///
/// Time only moves through [`SimulatedClock::advance`], [`SimulatedClock::set`],
/// or the optional auto-step: when a step is configured, every call to
/// [`ClockSource::now`] returns the current time and then moves it forward by
/// the step, so a busy-polling reader observes evenly spaced samples.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    now_ns: AtomicU64,
    step_ns: AtomicU64,
}

impl SimulatedClock {
    /// Create a frozen clock starting at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now_ns: AtomicU64::new(start.as_nanos()),
            step_ns: AtomicU64::new(0),
        }
    }

    /// Create a clock that advances by `step` on every read.
    #[must_use]
    pub fn with_auto_step(start: Timestamp, step: Duration) -> Self {
        let clock = Self::new(start);
        clock.set_auto_step(step);
        clock
    }

    /// Move time forward by `delta`. Injects a gap into any reader.
    pub fn advance(&self, delta: Duration) {
        self.now_ns.fetch_add(duration_to_nanos(delta), Ordering::AcqRel);
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: Timestamp) {
        self.now_ns.store(time.as_nanos(), Ordering::Release);
    }

    /// Change the per-read step. Zero freezes the clock.
    pub fn set_auto_step(&self, step: Duration) {
        self.step_ns.store(duration_to_nanos(step), Ordering::Release);
    }

    /// Current time without applying the auto-step.
    #[must_use]
    pub fn peek(&self) -> Timestamp {
        Timestamp::from_nanos(self.now_ns.load(Ordering::Acquire))
    }
}

impl ClockSource for SimulatedClock {
    fn now(&self) -> Timestamp {
        let step = self.step_ns.load(Ordering::Acquire);
        if step == 0 {
            return self.peek();
        }
        Timestamp::from_nanos(self.now_ns.fetch_add(step, Ordering::AcqRel))
    }

    fn name(&self) -> &str {
        "SimulatedClock"
    }
}
