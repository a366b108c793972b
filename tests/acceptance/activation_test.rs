//! Activation gate acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Without a debugger, activation starts nothing and the break is a no-op
//! - With a debugger, activation starts exactly one monitor no matter how
//!   many threads activate at once
//! - Activation never breaks on its own; the caller fires the trigger

use super::common::Harness;
use breakclock_common::state::MonitorState;
use breakclock_runtime::{BreakClock, NoDebugger, SimulatedClock};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_activate_without_debugger() {
    let clock = BreakClock::builder()
        .source(Arc::new(SimulatedClock::new(super::common::START)))
        .debugger(Arc::new(NoDebugger))
        .build()
        .unwrap();

    let trigger = clock.activate();
    assert!(trigger.is_noop());
    trigger.fire();
    clock.trigger_interactive_break();

    assert_eq!(clock.state(), MonitorState::Idle);
    assert_eq!(clock.stats().sessions, 0);
    assert_eq!(clock.now(), super::common::START);
}

#[test]
fn test_activate_then_fire() {
    let harness = Harness::new(Duration::from_millis(50));

    let trigger = harness.clock.activate();
    assert!(!trigger.is_noop());
    assert_eq!(harness.clock.state(), MonitorState::Running);
    assert_eq!(harness.debugger.break_count(), 0);

    trigger.fire();
    assert_eq!(harness.debugger.break_count(), 1);

    harness.drain();
    assert_eq!(harness.clock.state(), MonitorState::Idle);
}

#[test]
fn test_concurrent_activation_starts_one_monitor() {
    const THREADS: usize = 8;

    let harness = Harness::new(Duration::from_millis(50));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let clock = harness.clock.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                clock.ensure_monitor_started().unwrap()
            })
        })
        .collect();

    let started = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|spawned| *spawned)
        .count();

    assert_eq!(started, 1);
    assert_eq!(harness.clock.stats().sessions, 1);
    assert!(harness.clock.is_monitoring());

    harness.drain();
}

#[test]
fn test_reactivation_after_cooldown() {
    let harness = Harness::new(Duration::from_millis(20));

    assert!(harness.clock.ensure_monitor_started().unwrap());
    harness.drain();
    assert!(harness.clock.ensure_monitor_started().unwrap());
    harness.drain();

    assert_eq!(harness.clock.stats().sessions, 2);
}
