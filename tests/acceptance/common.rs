//! Common utilities for acceptance tests.

#![allow(dead_code)]

use breakclock_common::time::{ticks, Timestamp};
use breakclock_runtime::{BreakClock, ForcedDebugger, SimulatedClock};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Raw start time used by most scenarios (1s after the epoch).
pub const START: Timestamp = Timestamp::from_nanos(1_000_000_000);

/// Step that keeps a busy-polling monitor well under the default threshold.
pub const STEADY_STEP: Duration = ticks(500);

/// A clock over a frozen simulated source with a debugger forced attached.
pub struct Harness {
    pub source: Arc<SimulatedClock>,
    pub debugger: Arc<ForcedDebugger>,
    pub clock: BreakClock,
}

impl Harness {
    /// Build a harness with the given cooldown and default threshold.
    pub fn new(cooldown: Duration) -> Self {
        let source = Arc::new(SimulatedClock::new(START));
        let debugger = Arc::new(ForcedDebugger::new());
        let clock = BreakClock::builder()
            .cooldown(cooldown)
            .source(source.clone())
            .debugger(debugger.clone())
            .build()
            .expect("valid test configuration");
        Self {
            source,
            debugger,
            clock,
        }
    }

    /// Let the monitor run steadily until it returns to idle.
    pub fn drain(&self) {
        self.source.set_auto_step(STEADY_STEP);
        assert!(
            wait_for(Duration::from_secs(30), || !self.clock.is_monitoring()),
            "monitor did not cool down"
        );
        self.source.set_auto_step(Duration::ZERO);
    }
}

/// Poll `cond` every millisecond until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
