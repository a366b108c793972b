//! Pause classification.
//!
//! [`PauseDetector`] is the arithmetic core of the break monitor, kept free
//! of threads and atomics so it can be fed synthetic timestamps. Each sample
//! is compared with the previous one:
//!
//! - a gap shorter than the loop-check threshold is normal execution and
//!   counts towards the cooldown;
//! - anything else is a pause: the whole gap is added to the pause total and
//!   subtracted from the recent-run accumulator, which is clamped at zero.
//!
//! The monitor keeps sampling until the recent-run accumulator reaches the
//! cooldown.

use breakclock_common::time::Timestamp;
use std::time::Duration;

/// How a single sample gap was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Ordinary loop overhead.
    Run(Duration),
    /// Gap long enough to be a debugger pause.
    Pause(Duration),
}

impl Sample {
    /// Length of the classified gap.
    #[must_use]
    pub fn gap(&self) -> Duration {
        match self {
            Self::Run(d) | Self::Pause(d) => *d,
        }
    }

    /// Returns true for a pause.
    #[must_use]
    pub fn is_pause(&self) -> bool {
        matches!(self, Self::Pause(_))
    }
}

/// Sample-by-sample pause accounting for one monitor session.
#[derive(Debug, Clone)]
pub struct PauseDetector {
    threshold: Duration,
    cooldown: Duration,
    pause: Duration,
    recent_run: Duration,
    last_sample: Timestamp,
    samples: u64,
    pauses: u64,
    longest_pause: Duration,
}

impl PauseDetector {
    /// Start a session at `start`, carrying over the pause already accumulated.
    #[must_use]
    pub fn new(threshold: Duration, cooldown: Duration, start: Timestamp, pause: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            pause,
            recent_run: Duration::ZERO,
            last_sample: start,
            samples: 0,
            pauses: 0,
            longest_pause: Duration::ZERO,
        }
    }

    /// Classify the gap between the previous sample and `now`.
    ///
    /// A clock that steps backwards yields a zero gap.
    pub fn observe(&mut self, now: Timestamp) -> Sample {
        let elapsed = now.saturating_duration_since(self.last_sample);
        self.samples += 1;

        let sample = if elapsed < self.threshold {
            self.recent_run += elapsed;
            Sample::Run(elapsed)
        } else {
            self.recent_run = self.recent_run.saturating_sub(elapsed);
            self.pause += elapsed;
            self.pauses += 1;
            self.longest_pause = self.longest_pause.max(elapsed);
            Sample::Pause(elapsed)
        };

        self.last_sample = now;
        sample
    }

    /// True once enough uninterrupted execution has been seen to stop.
    #[must_use]
    pub fn is_cooled_down(&self) -> bool {
        self.recent_run >= self.cooldown
    }

    /// Total pause time, including what was carried over.
    #[must_use]
    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Recent normal-execution accumulator.
    #[must_use]
    pub fn recent_run(&self) -> Duration {
        self.recent_run
    }

    /// Timestamp of the most recent sample.
    #[must_use]
    pub fn last_sample(&self) -> Timestamp {
        self.last_sample
    }

    /// Samples observed in this session.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Pauses detected in this session.
    #[must_use]
    pub fn pauses(&self) -> u64 {
        self.pauses
    }

    /// Longest single pause in this session.
    #[must_use]
    pub fn longest_pause(&self) -> Duration {
        self.longest_pause
    }

    /// Loop-check threshold in use.
    #[must_use]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Cooldown in use.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
