//! Configuration loading acceptance tests.

use breakclock_common::config::{ClockConfig, DebuggerMode};
use breakclock_runtime::BreakClock;
use std::time::Duration;

#[test]
fn test_clock_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("breakclock.toml");
    std::fs::write(
        &path,
        r#"
cooldown = "2s"
loop_check_threshold = "150us"
debugger = "never"

[auto_start]
enabled = true
poll_interval = "20ms"
"#,
    )
    .unwrap();

    let config = ClockConfig::from_file(&path).unwrap();
    assert_eq!(config.cooldown, Duration::from_secs(2));
    assert_eq!(config.loop_check_threshold, Duration::from_micros(150));
    assert_eq!(config.debugger, DebuggerMode::Never);
    assert_eq!(config.auto_start.tolerance(), Duration::from_millis(40));

    let clock = BreakClock::from_config(config).unwrap();
    assert!(clock.is_watching());
    assert!(!clock.debugger_attached());
    assert!(clock.activate().is_noop());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ClockConfig::from_toml(r#"cooldown = "0s""#).unwrap();
    let err = BreakClock::from_config(config).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_stats_serialize_to_json() {
    let config = ClockConfig {
        debugger: DebuggerMode::Never,
        ..ClockConfig::default()
    };
    let clock = BreakClock::from_config(config).unwrap();
    let json = serde_json::to_value(clock.stats()).unwrap();
    assert_eq!(json["sessions"], 0);
    assert_eq!(json["pauses_detected"], 0);
}
