//! Debugger attachment probes and the host interactive break.
//!
//! Both are external to the clock: the probe answers "is a debugger
//! attached", and the break is an opaque side effect the caller may choose
//! to fire after activating the monitor.

use breakclock_common::config::DebuggerMode;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Host debugger capability.
pub trait DebuggerHost: Debug + Send + Sync + 'static {
    /// Whether a debugger is attached to this process right now.
    fn is_attached(&self) -> bool;

    /// Stop at an interactive breakpoint.
    fn interactive_break(&self);
}

/// Shared debugger host handle.
pub type SharedDebugger = Arc<dyn DebuggerHost>;

/// Build the debugger host selected by configuration.
#[must_use]
pub fn debugger_for_mode(mode: DebuggerMode) -> SharedDebugger {
    match mode {
        DebuggerMode::Auto => Arc::new(HostDebugger::new()),
        DebuggerMode::Never => Arc::new(NoDebugger),
        DebuggerMode::Always => Arc::new(ForcedDebugger::new()),
    }
}

/// Never reports a debugger. The break is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDebugger;

impl DebuggerHost for NoDebugger {
    fn is_attached(&self) -> bool {
        false
    }

    fn interactive_break(&self) {}
}

/// Asks the operating system whether the process is being traced.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostDebugger;

impl HostDebugger {
    /// Create a host-backed probe.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DebuggerHost for HostDebugger {
    fn is_attached(&self) -> bool {
        tracer_pid().is_some()
    }

    fn interactive_break(&self) {
        raise_breakpoint();
    }
}

/// Pretends a debugger is always attached.
///
/// Breaks are counted instead of raised so the process is not killed when
/// nothing is actually tracing it.
#[derive(Debug, Default)]
pub struct ForcedDebugger {
    breaks: AtomicU64,
}

impl ForcedDebugger {
    /// Create a forced probe with a zero break count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interactive breaks requested so far.
    pub fn break_count(&self) -> u64 {
        self.breaks.load(Ordering::Relaxed)
    }
}

impl DebuggerHost for ForcedDebugger {
    fn is_attached(&self) -> bool {
        true
    }

    fn interactive_break(&self) {
        let n = self.breaks.fetch_add(1, Ordering::Relaxed) + 1;
        info!(breaks = n, "Simulated interactive break");
    }
}

/// PID of the tracing process, if any.
#[cfg(target_os = "linux")]
fn tracer_pid() -> Option<u32> {
    let status = match std::fs::read_to_string("/proc/self/status") {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!("Cannot read /proc/self/status: {e}");
            return None;
        }
    };
    parse_tracer_pid(&status)
}

#[cfg(not(target_os = "linux"))]
fn tracer_pid() -> Option<u32> {
    None
}

/// Extract a non-zero `TracerPid` from `/proc/<pid>/status` contents.
fn parse_tracer_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|&pid| pid != 0)
}

#[cfg(unix)]
fn raise_breakpoint() {
    use nix::sys::signal::{raise, Signal};

    if let Err(e) = raise(Signal::SIGTRAP) {
        warn!("Failed to raise SIGTRAP: {e}");
    }
}

#[cfg(not(unix))]
fn raise_breakpoint() {
    warn!("Interactive break not supported on this platform");
}
