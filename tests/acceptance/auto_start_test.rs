//! Auto-start watcher acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - The watcher can be started once per clock; a second start fails and
//!   leaves the first watcher running
//! - A clock jump larger than twice the poll interval starts the monitor
//! - Without a debugger the watcher never starts the monitor

use super::common::{wait_for, Harness, START};
use breakclock_common::config::{AutoStartConfig, ClockConfig};
use breakclock_common::error::ClockError;
use breakclock_runtime::{BreakClock, NoDebugger, SimulatedClock};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_second_start_fails() {
    let harness = Harness::new(Duration::from_millis(50));

    let watcher = harness
        .clock
        .start_auto_watcher(Duration::from_millis(10))
        .unwrap();
    assert_eq!(watcher.tolerance(), Duration::from_millis(20));

    let err = harness
        .clock
        .start_auto_watcher(Duration::from_millis(10))
        .unwrap_err();
    assert_eq!(err, ClockError::WatcherAlreadyStarted);
    assert!(harness.clock.is_watching());
}

#[test]
fn test_config_enabled_watcher_counts_as_started() {
    let config = ClockConfig {
        auto_start: AutoStartConfig {
            enabled: true,
            poll_interval: Duration::from_millis(10),
        },
        ..ClockConfig::default()
    };
    let clock = BreakClock::builder()
        .config(config)
        .source(Arc::new(SimulatedClock::new(START)))
        .debugger(Arc::new(NoDebugger))
        .build()
        .unwrap();

    assert!(clock.is_watching());
    assert_eq!(
        clock.start_auto_watcher(Duration::from_millis(10)).unwrap_err(),
        ClockError::WatcherAlreadyStarted
    );
}

#[test]
fn test_clock_jump_starts_monitor() {
    let harness = Harness::new(Duration::from_millis(50));
    harness
        .clock
        .start_auto_watcher(Duration::from_millis(5))
        .unwrap();

    // Frozen source: no drift, no activation
    thread::sleep(Duration::from_millis(30));
    assert_eq!(harness.clock.stats().sessions, 0);

    harness.source.advance(Duration::from_secs(1));
    assert!(wait_for(Duration::from_secs(5), || {
        harness.clock.stats().watcher_activations >= 1
    }));
    assert!(harness.clock.stats().sessions >= 1);

    harness.drain();
}

#[test]
fn test_watcher_ignores_jumps_without_debugger() {
    let source = Arc::new(SimulatedClock::new(START));
    let clock = BreakClock::builder()
        .source(source.clone())
        .debugger(Arc::new(NoDebugger))
        .build()
        .unwrap();
    clock.start_auto_watcher(Duration::from_millis(5)).unwrap();

    for _ in 0..5 {
        source.advance(Duration::from_secs(1));
        thread::sleep(Duration::from_millis(15));
    }

    assert!(!clock.is_monitoring());
    assert_eq!(clock.stats().sessions, 0);
    assert_eq!(clock.stats().watcher_activations, 0);
}
