//! Status reports for the demo daemon.
//!
//! A report compares how much raw wall-clock time and how much virtual time
//! passed since the daemon started. Their difference is the pause time the
//! monitor has credited.

use breakclock_common::state::MonitorState;
use breakclock_common::stats::MonitorStats;
use breakclock_common::time::Timestamp;
use breakclock_runtime::BreakClock;
use serde::Serialize;
use std::time::Duration;

/// Point-in-time comparison of raw and virtual time.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Reports emitted so far, starting at 1.
    pub sequence: u64,
    /// Current virtual time.
    pub virtual_now: Timestamp,
    /// Raw time elapsed since start.
    pub raw_elapsed: Duration,
    /// Virtual time elapsed since start.
    pub virtual_elapsed: Duration,
    /// Accumulated pause time.
    pub pause_time: Duration,
    /// Monitor state at the time of the report.
    pub state: MonitorState,
    /// Whether the debugger host reports an attached debugger.
    pub debugger_attached: bool,
    /// Monitor statistics.
    pub stats: MonitorStats,
}

/// Baseline for elapsed-time reports.
#[derive(Debug)]
pub struct Reporter {
    raw_start: Timestamp,
    virtual_start: Timestamp,
    sequence: u64,
}

impl Reporter {
    /// Capture the baseline from `clock`.
    pub fn new(clock: &BreakClock) -> Self {
        Self {
            raw_start: clock.raw_now(),
            virtual_start: clock.now(),
            sequence: 0,
        }
    }

    /// Build the next report.
    pub fn report(&mut self, clock: &BreakClock) -> StatusReport {
        self.sequence += 1;
        let virtual_now = clock.now();
        StatusReport {
            sequence: self.sequence,
            virtual_now,
            raw_elapsed: clock.raw_now() - self.raw_start,
            virtual_elapsed: virtual_now - self.virtual_start,
            pause_time: clock.pause_time(),
            state: clock.state(),
            debugger_attached: clock.debugger_attached(),
            stats: clock.stats(),
        }
    }
}

impl StatusReport {
    /// One-line human readable form.
    pub fn to_text(&self) -> String {
        format!(
            "#{seq} virtual={now} raw_elapsed={raw} virtual_elapsed={virt} pause={pause} state={state} sessions={sessions}",
            seq = self.sequence,
            now = self.virtual_now,
            raw = fmt_duration(self.raw_elapsed),
            virt = fmt_duration(self.virtual_elapsed),
            pause = fmt_duration(self.pause_time),
            state = self.state,
            sessions = self.stats.sessions,
        )
    }

    /// Single-line JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Round to milliseconds before formatting to keep lines short.
fn fmt_duration(d: Duration) -> String {
    let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
    humantime::format_duration(Duration::from_millis(millis)).to_string()
}
