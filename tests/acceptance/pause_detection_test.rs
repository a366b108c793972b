//! Pause detection acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Steady execution returns the monitor to idle after the cooldown with no
//!   pause credited
//! - A single gap above the threshold is credited in full
//! - Accumulated pause never decreases
//! - Accumulated pause stops changing once the monitor is idle
//! - Virtual time does not jump forward across a pause

use super::common::{wait_for, Harness, START, STEADY_STEP};
use breakclock_common::state::MonitorState;
use breakclock_common::time::{ticks, Timestamp};
use breakclock_runtime::{BreakClock, ForcedDebugger, PauseDetector, Sample, SimulatedClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_steady_execution_cools_down_without_pause() {
    let source = Arc::new(SimulatedClock::with_auto_step(START, STEADY_STEP));
    let clock = BreakClock::builder()
        .source(source.clone())
        .debugger(Arc::new(ForcedDebugger::new()))
        .build()
        .unwrap();

    assert!(clock.ensure_monitor_started().unwrap());
    assert!(wait_for(Duration::from_secs(60), || !clock.is_monitoring()));

    assert_eq!(clock.state(), MonitorState::Idle);
    assert_eq!(clock.pause_time(), Duration::ZERO);

    // 5s of 50us steps
    let stats = clock.stats();
    assert_eq!(stats.samples, 100_000);
    assert_eq!(stats.pauses_detected, 0);
    assert_eq!(stats.sessions, 1);
}

#[test]
fn test_detector_credits_single_jump_exactly() {
    let threshold = ticks(2000);
    let mut detector =
        PauseDetector::new(threshold, Duration::from_secs(5), START, Duration::ZERO);

    let mut now = START;
    for _ in 0..1_000 {
        now = now + STEADY_STEP;
        assert!(!detector.observe(now).is_pause());
    }
    let before = detector.pause();

    now = now + Duration::from_millis(50);
    assert_eq!(
        detector.observe(now),
        Sample::Pause(Duration::from_millis(50))
    );
    assert_eq!(detector.pause() - before, Duration::from_millis(50));
    assert_eq!(detector.recent_run(), Duration::ZERO);
}

#[test]
fn test_monitor_credits_injected_gap() {
    let harness = Harness::new(Duration::from_millis(100));
    let clock = &harness.clock;

    assert!(clock.ensure_monitor_started().unwrap());
    // The frozen source keeps the session open until we drain it
    harness.source.advance(Duration::from_millis(50));
    assert!(wait_for(Duration::from_secs(10), || {
        clock.pause_time() == Duration::from_millis(50)
    }));

    harness.drain();

    assert_eq!(clock.pause_time(), Duration::from_millis(50));
    let stats = clock.stats();
    assert_eq!(stats.pauses_detected, 1);
    assert_eq!(stats.longest_pause, Duration::from_millis(50));
    assert_eq!(stats.total_pause, Duration::from_millis(50));
}

#[test]
fn test_idle_now_is_raw_minus_pause() {
    let harness = Harness::new(Duration::from_millis(50));
    let clock = &harness.clock;

    assert!(clock.ensure_monitor_started().unwrap());
    harness.source.advance(Duration::from_secs(3));
    assert!(wait_for(Duration::from_secs(10), || {
        clock.pause_time() == Duration::from_secs(3)
    }));
    harness.drain();

    // The source is frozen again, so both reads see the same raw time
    let raw = harness.source.peek();
    assert_eq!(clock.now(), raw - Duration::from_secs(3));
    assert_eq!(clock.now(), clock.raw_now() - clock.pause_time());
}

#[test]
fn test_pause_frozen_while_idle() {
    let harness = Harness::new(Duration::from_millis(50));
    let clock = &harness.clock;

    assert!(clock.ensure_monitor_started().unwrap());
    harness.source.advance(Duration::from_millis(10));
    assert!(wait_for(Duration::from_secs(10), || {
        clock.pause_time() == Duration::from_millis(10)
    }));
    harness.drain();
    let before = clock.pause_time();

    // No monitor is sampling, so this jump is not credited
    harness.source.advance(Duration::from_secs(5));
    thread::sleep(Duration::from_millis(20));

    assert_eq!(clock.state(), MonitorState::Idle);
    assert_eq!(clock.pause_time(), before);
    assert_eq!(clock.now(), harness.source.peek() - before);
    assert_eq!(clock.stats().sessions, 1);
}

#[test]
fn test_virtual_time_holds_across_pause() {
    let harness = Harness::new(Duration::from_millis(50));
    let clock = &harness.clock;

    assert!(clock.ensure_monitor_started().unwrap());
    let before = clock.now();
    assert_eq!(before, START);

    harness.source.advance(Duration::from_secs(10));
    assert!(wait_for(Duration::from_secs(10), || {
        clock.last_sample() == START + Duration::from_secs(10)
            && clock.pause_time() == Duration::from_secs(10)
    }));

    // Raw time moved ten seconds, virtual time did not
    assert_eq!(clock.raw_now(), START + Duration::from_secs(10));
    assert_eq!(clock.now(), before);

    harness.drain();
    assert!(clock.now() >= before);
}

#[test]
fn test_pause_is_monotonic_under_concurrent_reads() {
    let harness = Harness::new(Duration::from_millis(20));
    let clock = harness.clock.clone();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let clock = clock.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = Duration::ZERO;
            let mut reads = 0u64;
            while !done.load(Ordering::Relaxed) {
                let pause = clock.pause_time();
                assert!(pause >= last, "pause went backwards: {last:?} -> {pause:?}");
                last = pause;
                reads += 1;
            }
            reads
        })
    };

    for round in 1..=5u32 {
        assert!(clock.ensure_monitor_started().unwrap());
        harness.source.advance(Duration::from_millis(10));
        let expected = Duration::from_millis(10) * round;
        assert!(wait_for(Duration::from_secs(10), || clock.pause_time() == expected));
        harness.drain();
    }

    done.store(true, Ordering::Relaxed);
    let reads = reader.join().unwrap();
    assert!(reads > 0);
    assert_eq!(clock.pause_time(), Duration::from_millis(50));
    assert_eq!(clock.stats().sessions, 5);
}

#[test]
fn test_backwards_step_is_not_a_pause() {
    let harness = Harness::new(Duration::from_millis(50));
    let clock = &harness.clock;

    assert!(clock.ensure_monitor_started().unwrap());
    harness.source.set(Timestamp::from_nanos(START.as_nanos() - 1_000_000));
    // Give the monitor time to observe the step
    thread::sleep(Duration::from_millis(20));
    assert_eq!(clock.pause_time(), Duration::ZERO);

    harness.drain();
    assert_eq!(clock.stats().pauses_detected, 0);
}
