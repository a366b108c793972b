//! Error types for the break clock.

use thiserror::Error;

/// Errors raised while configuring or driving a break clock.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The auto-start watcher was already started for this clock.
    #[error("configuration error: auto-start watcher was already started")]
    WatcherAlreadyStarted,

    /// The process-wide clock was installed more than once.
    #[error("configuration error: global break clock is already installed")]
    AlreadyInstalled,

    /// A background thread could not be spawned.
    #[error("failed to spawn {thread} thread: {reason}")]
    Spawn {
        /// Name of the thread that failed to start.
        thread: String,
        /// Underlying OS error message.
        reason: String,
    },

    /// Invalid monitor state transition attempted.
    #[error("invalid monitor state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Source state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl ClockError {
    /// Returns true for errors caused by misconfiguration rather than the host.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::WatcherAlreadyStarted | Self::AlreadyInstalled
        )
    }
}

/// Convenience type alias for break clock operations.
pub type ClockResult<T> = Result<T, ClockError>;
