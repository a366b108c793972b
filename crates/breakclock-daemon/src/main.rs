//! breakclock demo daemon.
//!
//! Installs the process-wide break clock and periodically reports how far
//! raw and virtual time have diverged. Attach a debugger, stop the process
//! for a while, continue, and watch the pause time grow while virtual
//! elapsed time stays close to the time the process actually ran.

mod report;
mod signals;

use anyhow::{Context, Result};
use breakclock_common::config::{ClockConfig, DebuggerMode};
use breakclock_runtime::global;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::report::Reporter;
use crate::signals::{wait_for_shutdown, SignalHandler};

/// Environment variable naming a config file.
const CONFIG_ENV: &str = "BREAKCLOCK_CONFIG_PATH";

/// Config file used when present in the working directory.
const LOCAL_CONFIG: &str = "config/breakclock.toml";

/// breakclock command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "breakclock",
    about = "Debugger-pause compensating clock demo",
    version,
    long_about = None
)]
struct Args {
    /// Path to a clock configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Continuous normal execution that ends a monitor session (e.g. "5s").
    #[arg(long, value_parser = humantime::parse_duration)]
    cooldown: Option<Duration>,

    /// Sample gap above which time counts as a pause (e.g. "200us").
    #[arg(long, value_parser = humantime::parse_duration)]
    threshold: Option<Duration>,

    /// Auto-start watcher poll interval (e.g. "100ms").
    #[arg(long, value_parser = humantime::parse_duration)]
    poll_interval: Option<Duration>,

    /// Start the auto-start watcher.
    #[arg(long)]
    auto_start: bool,

    /// Treat the process as debugger-attached even without a tracer.
    #[arg(long)]
    force_attached: bool,

    /// Activate the clock once at startup and fire the break.
    #[arg(long)]
    break_at_start: bool,

    /// How long to run (0 = until SIGINT/SIGTERM).
    #[arg(long, default_value = "0s", value_parser = humantime::parse_duration)]
    duration: Duration,

    /// Interval between status reports.
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    report_interval: Duration,

    /// Print reports as JSON lines on stdout.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting breakclock");

    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);

    info!(
        ?config.cooldown,
        ?config.loop_check_threshold,
        ?config.debugger,
        auto_start = config.auto_start.enabled,
        "Configuration loaded"
    );

    let signal_handler = SignalHandler::new().context("Failed to set up signal handlers")?;

    run(config, &args, &signal_handler)
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("breakclock={level},breakclock_runtime={level},breakclock_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_names(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `BREAKCLOCK_CONFIG_PATH` environment variable
/// 3. `config/breakclock.toml` (local development)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<ClockConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return ClockConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from {}", CONFIG_ENV);
            return ClockConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from {CONFIG_ENV}={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "{} set but file does not exist, checking other locations", CONFIG_ENV
        );
    }

    let local_path = PathBuf::from(LOCAL_CONFIG);
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return ClockConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {local_path:?}"));
    }

    info!("No config file found, using built-in defaults");
    Ok(ClockConfig::default())
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(config: &mut ClockConfig, args: &Args) {
    if let Some(cooldown) = args.cooldown {
        config.cooldown = cooldown;
    }
    if let Some(threshold) = args.threshold {
        config.loop_check_threshold = threshold;
    }
    if let Some(poll_interval) = args.poll_interval {
        config.auto_start.poll_interval = poll_interval;
    }
    if args.auto_start {
        config.auto_start.enabled = true;
    }
    if args.force_attached {
        config.debugger = DebuggerMode::Always;
    }
}

/// Install the clock and report until shutdown or the run duration ends.
fn run(config: ClockConfig, args: &Args, signal_handler: &SignalHandler) -> Result<()> {
    let clock = global::install(config).context("Failed to install break clock")?;
    let mut reporter = Reporter::new(clock);

    if !clock.debugger_attached() {
        info!("No debugger attached; pauses are only tracked once one attaches");
    }

    if args.break_at_start {
        info!("Breaking at start");
        global::activate().fire();
    }

    let started = Instant::now();
    let deadline = (!args.duration.is_zero()).then_some(args.duration);

    loop {
        let wait = match deadline {
            Some(total) => {
                let remaining = total.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    info!("Run duration reached");
                    break;
                }
                remaining.min(args.report_interval)
            }
            None => args.report_interval,
        };

        if wait_for_shutdown(signal_handler, wait) {
            info!("Shutdown requested");
            break;
        }
        signal_handler.take_report_request();

        let status = reporter.report(clock);
        if args.json {
            println!("{}", status.to_json().context("Failed to encode report")?);
        } else {
            info!("{}", status.to_text());
        }
    }

    let stats = clock.stats();
    info!(
        sessions = stats.sessions,
        watcher_activations = stats.watcher_activations,
        pauses = stats.pauses_detected,
        total_pause_ms = stats.total_pause.as_millis(),
        longest_pause_ms = stats.longest_pause.as_millis(),
        signals = signal_handler.state().signal_count(),
        "breakclock stopped"
    );
    Ok(())
}
