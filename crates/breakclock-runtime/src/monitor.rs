//! Break monitor thread.
//!
//! The monitor busy-polls the clock source on a dedicated thread and never
//! sleeps or yields. Any real stop of the process (a debugger break, or OS
//! preemption longer than the loop-check threshold) also stops this thread,
//! so a long gap between two consecutive samples is itself the pause signal.
//! This costs one fully utilised core while a session is running.
//!
//! A session ends on its own once [`PauseDetector::is_cooled_down`] holds.
//! There is no stop request; the only exit is the cooldown.

use crate::clock::ClockShared;
use crate::detector::PauseDetector;
use breakclock_common::error::{ClockError, ClockResult};
use breakclock_common::state::MonitorState;
use breakclock_common::time::Timestamp;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handle to a running monitor thread.
#[derive(Debug)]
pub struct MonitorHandle {
    /// Dropped (detached) when the monitor clears itself on exit.
    thread: JoinHandle<()>,
    /// Raw time at which the session started.
    started_at: Timestamp,
}

impl MonitorHandle {
    /// Raw time at which the session started.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Name of the monitor thread.
    #[must_use]
    pub fn thread_name(&self) -> Option<&str> {
        self.thread.thread().name()
    }
}

/// Monitor state and the handle of the thread in it, guarded together.
#[derive(Debug, Default)]
pub(crate) struct MonitorSlot {
    pub(crate) state: MonitorState,
    pub(crate) handle: Option<MonitorHandle>,
}

/// Lock the monitor slot, ignoring poisoning.
///
/// The slot only holds a state and a handle; a panic while it was held cannot
/// leave it half-written.
pub(crate) fn lock_slot(slot: &Mutex<MonitorSlot>) -> MutexGuard<'_, MonitorSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// IDLE → RUNNING. Must be called with the monitor slot locked.
pub(crate) fn spawn(shared: &Arc<ClockShared>, slot: &mut MonitorSlot) -> ClockResult<()> {
    slot.state.transition_to(MonitorState::Running)?;

    let start = shared.source.now();
    let detector = PauseDetector::new(
        shared.config.loop_check_threshold,
        shared.config.cooldown,
        start,
        shared.pause(),
    );

    // Readers switch to the last sample as soon as `running` is set.
    shared.publish(detector.pause(), Duration::ZERO, start);
    shared.running.store(true, Ordering::Release);

    let thread_name = shared.config.monitor_thread_name.clone();
    let worker_shared = Arc::clone(shared);
    let thread = match thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || run(&worker_shared, detector))
    {
        Ok(t) => t,
        Err(e) => {
            // Roll back so the gate can try again later
            shared.running.store(false, Ordering::Release);
            slot.state = MonitorState::Idle;
            return Err(ClockError::Spawn {
                thread: thread_name,
                reason: e.to_string(),
            });
        }
    };

    shared.counters.record_session();
    info!(
        thread = %thread_name,
        started_at = %start,
        pause_ms = shared.pause().as_millis(),
        "Break monitor started"
    );

    slot.handle = Some(MonitorHandle {
        thread,
        started_at: start,
    });
    Ok(())
}

/// Monitor thread body.
fn run(shared: &ClockShared, mut detector: PauseDetector) {
    let mut session = SessionGuard {
        shared,
        pause_before: detector.pause(),
        samples: 0,
        pauses: 0,
        longest_pause: Duration::ZERO,
    };

    // No logging in here: any I/O would show up as a pause.
    while !detector.is_cooled_down() {
        let sample = shared.source.now();
        detector.observe(sample);
        shared.publish(detector.pause(), detector.recent_run(), detector.last_sample());
    }

    session.samples = detector.samples();
    session.pauses = detector.pauses();
    session.longest_pause = detector.longest_pause();
}

/// RUNNING → IDLE on scope exit, including unwinding.
struct SessionGuard<'a> {
    shared: &'a ClockShared,
    pause_before: Duration,
    samples: u64,
    pauses: u64,
    longest_pause: Duration,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let shared = self.shared;
        let session_pause = shared.pause().saturating_sub(self.pause_before);
        shared.counters.record_session_end(
            self.samples,
            self.pauses,
            self.longest_pause,
            session_pause,
        );

        let handle = {
            let mut slot = lock_slot(&shared.monitor);
            if let Err(e) = slot.state.transition_to(MonitorState::Idle) {
                warn!(error = %e, "Monitor slot out of sync");
            }
            shared.recent_run_ns.store(0, Ordering::Relaxed);
            shared.running.store(false, Ordering::Release);
            slot.handle.take()
        };
        // Dropping our own JoinHandle just detaches it
        drop(handle);

        info!(
            samples = self.samples,
            pauses = self.pauses,
            session_pause_ms = session_pause.as_millis(),
            total_pause_ms = shared.pause().as_millis(),
            "Break monitor cooled down"
        );
        debug!(longest_pause_us = self.longest_pause.as_micros(), "Session detail");
    }
}
