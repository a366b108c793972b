//! Signal handling for the demo daemon.
//!
//! SIGINT and SIGTERM request a graceful shutdown. SIGHUP asks for an
//! immediate status report. Handlers only flip atomics; a small poll thread
//! forwards them to the shared [`SignalState`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Signals the daemon reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGTERM or SIGINT.
    Shutdown,
    /// SIGHUP.
    Report,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Shutdown => write!(f, "shutdown"),
            SignalKind::Report => write!(f, "report"),
        }
    }
}

/// Flags shared between the signal poll thread and the main loop.
#[derive(Debug, Default)]
pub struct SignalState {
    shutdown_requested: AtomicBool,
    report_requested: AtomicBool,
    signal_count: AtomicU32,
}

impl SignalState {
    /// Create a new signal state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Relaxed)
    }

    /// Check if a report has been requested (and clear the flag).
    #[inline]
    pub fn take_report_request(&self) -> bool {
        self.report_requested.swap(false, Ordering::Relaxed)
    }

    /// Request shutdown (can be called from any thread).
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Relaxed);
    }

    /// Request a report (can be called from any thread).
    pub fn request_report(&self) {
        self.report_requested.store(true, Ordering::Relaxed);
    }

    fn record_signal(&self, kind: SignalKind) {
        self.signal_count.fetch_add(1, Ordering::Relaxed);
        debug!(%kind, "Signal recorded");
    }

    /// Total number of signals received.
    pub fn signal_count(&self) -> u32 {
        self.signal_count.load(Ordering::Relaxed)
    }
}

/// Registers the process signal handlers and exposes their state.
#[derive(Clone)]
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    /// Create a handler and register Unix signal handlers.
    ///
    /// On other platforms only manual shutdown is available.
    pub fn new() -> std::io::Result<Self> {
        let handler = Self {
            state: Arc::new(SignalState::new()),
        };

        #[cfg(unix)]
        handler.register_unix_handlers()?;

        Ok(handler)
    }

    #[cfg(unix)]
    fn register_unix_handlers(&self) -> std::io::Result<()> {
        use std::os::raw::c_int;

        static SHUTDOWN_FLAG: AtomicBool = AtomicBool::new(false);
        static REPORT_FLAG: AtomicBool = AtomicBool::new(false);

        let state = Arc::clone(&self.state);
        std::thread::Builder::new()
            .name("signal-poll".into())
            .spawn(move || loop {
                if SHUTDOWN_FLAG.swap(false, Ordering::Relaxed) {
                    info!("Shutdown signal received");
                    state.request_shutdown();
                    state.record_signal(SignalKind::Shutdown);
                }
                if REPORT_FLAG.swap(false, Ordering::Relaxed) {
                    state.request_report();
                    state.record_signal(SignalKind::Report);
                }
                if state.shutdown_requested() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(10));
            })?;

        extern "C" fn shutdown_handler(_: c_int) {
            SHUTDOWN_FLAG.store(true, Ordering::Relaxed);
        }

        extern "C" fn report_handler(_: c_int) {
            REPORT_FLAG.store(true, Ordering::Relaxed);
        }

        // SAFETY: the handlers only store to atomics, which is async-signal-safe.
        unsafe {
            libc::signal(libc::SIGTERM, shutdown_handler as libc::sighandler_t);
            libc::signal(libc::SIGINT, shutdown_handler as libc::sighandler_t);
            libc::signal(libc::SIGHUP, report_handler as libc::sighandler_t);
        }

        debug!("Unix signal handlers registered");
        Ok(())
    }

    /// Check if shutdown has been requested.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        self.state.shutdown_requested()
    }

    /// Check if a report has been requested (clears the flag).
    #[inline]
    pub fn take_report_request(&self) -> bool {
        self.state.take_report_request()
    }

    /// Manually request shutdown.
    pub fn request_shutdown(&self) {
        self.state.request_shutdown();
    }

    /// Signal state for inspection.
    pub fn state(&self) -> &SignalState {
        &self.state
    }
}

/// Sleep up to `timeout`, waking early on shutdown or a report request.
///
/// Returns `true` if shutdown was requested.
pub fn wait_for_shutdown(handler: &SignalHandler, timeout: Duration) -> bool {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    while start.elapsed() < timeout {
        if handler.shutdown_requested() {
            return true;
        }
        if handler.state.report_requested.load(Ordering::Relaxed) {
            return false;
        }
        std::thread::sleep(poll_interval.min(timeout.saturating_sub(start.elapsed())));
    }

    handler.shutdown_requested()
}
