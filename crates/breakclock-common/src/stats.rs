//! Pause detection statistics.
//!
//! Counters are plain atomics so the busy-poll monitor can update them
//! without locking. Readers take a [`MonitorStats`] snapshot, which may be
//! slightly stale but never torn per field.

use crate::time::duration_to_nanos;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters shared between the monitor, the watcher, and readers.
#[derive(Debug, Default)]
pub struct PauseCounters {
    /// Monitor sessions started (IDLE → RUNNING transitions).
    sessions: AtomicU64,
    /// Sessions started by the auto-start watcher.
    watcher_activations: AtomicU64,
    /// Samples classified as a pause.
    pauses: AtomicU64,
    /// Longest single gap credited as pause, in nanoseconds.
    longest_pause_ns: AtomicU64,
    /// Pause credited by completed sessions, in nanoseconds.
    completed_pause_ns: AtomicU64,
    /// Total samples taken across all sessions.
    samples: AtomicU64,
}

impl PauseCounters {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a monitor session.
    pub fn record_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session started by the auto-start watcher.
    pub fn record_watcher_activation(&self) {
        self.watcher_activations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the end of a monitor session.
    ///
    /// Called once per session so the busy-poll loop only touches local
    /// counters while sampling.
    pub fn record_session_end(
        &self,
        samples: u64,
        pauses: u64,
        longest_pause: Duration,
        session_pause: Duration,
    ) {
        self.samples.fetch_add(samples, Ordering::Relaxed);
        self.pauses.fetch_add(pauses, Ordering::Relaxed);
        self.longest_pause_ns
            .fetch_max(duration_to_nanos(longest_pause), Ordering::Relaxed);
        self.completed_pause_ns
            .fetch_add(duration_to_nanos(session_pause), Ordering::Relaxed);
    }

    /// Take a snapshot combined with the clock's accumulated pause time.
    #[must_use]
    pub fn snapshot(&self, total_pause: Duration) -> MonitorStats {
        MonitorStats {
            sessions: self.sessions.load(Ordering::Relaxed),
            watcher_activations: self.watcher_activations.load(Ordering::Relaxed),
            pauses_detected: self.pauses.load(Ordering::Relaxed),
            longest_pause: Duration::from_nanos(self.longest_pause_ns.load(Ordering::Relaxed)),
            completed_pause: Duration::from_nanos(self.completed_pause_ns.load(Ordering::Relaxed)),
            total_pause,
            samples: self.samples.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the pause counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Monitor sessions started.
    pub sessions: u64,
    /// Sessions started by the auto-start watcher.
    pub watcher_activations: u64,
    /// Gaps classified as pause in completed sessions.
    pub pauses_detected: u64,
    /// Longest single pause in completed sessions.
    pub longest_pause: Duration,
    /// Pause credited by completed sessions.
    pub completed_pause: Duration,
    /// Accumulated pause time, including the running session.
    pub total_pause: Duration,
    /// Samples taken in completed sessions.
    pub samples: u64,
}

impl MonitorStats {
    /// Mean length of a pause detected in a completed session.
    #[must_use]
    pub fn mean_pause(&self) -> Option<Duration> {
        if self.pauses_detected == 0 {
            return None;
        }
        let total = duration_to_nanos(self.completed_pause);
        Some(Duration::from_nanos(total / self.pauses_detected))
    }
}
