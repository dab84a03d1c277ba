//! Error types for the timer, its persistence adapter and its commit sink.

use thiserror::Error;

use crate::state::timer_state::MIN_COMMIT_MS;

/// Errors surfaced by timer controller operations.
///
/// Validation variants never change the timer state. A sink failure leaves
/// the timer stopped with its elapsed time and description intact.
#[derive(Error, Debug)]
pub enum TimerError {
    /// Commit attempted without a description.
    #[error("description required")]
    DescriptionRequired,

    /// Commit attempted before the minimum duration accrued.
    #[error("at least {} seconds must be tracked before committing (tracked {elapsed_ms}ms)", MIN_COMMIT_MS / 1000)]
    BelowMinimum { elapsed_ms: i64 },

    /// Discard attempted without explicit confirmation.
    #[error("discard must be confirmed")]
    ConfirmationRequired,

    /// The commit sink rejected or failed to receive the entry.
    #[error("failed to save time entry: {0}")]
    Sink(#[from] SinkError),
}

impl TimerError {
    /// Whether this is a local validation failure rather than a remote one.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::DescriptionRequired | Self::BelowMinimum { .. })
    }
}

/// Errors from the remote time entry collection.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The request never produced a response.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The sink is misconfigured (bad URL, unusable API key).
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl SinkError {
    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Check if a later attempt could succeed.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Config { .. } => false,
        }
    }
}

/// Errors from the local key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The temporary file could not replace the store file.
    #[error("failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The store refuses writes (quota exhausted, disabled, poisoned lock).
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StoreError {
    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
