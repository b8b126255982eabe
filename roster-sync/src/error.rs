//! Error types for roster-sync.
//!
//! Only [`SyncError`] ever ends a pass. Everything else is caught per row
//! and turned into a logged outcome or a status write.

use thiserror::Error;

/// A create / delete / verify call rejected by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostingError {
    #[error("login '{0}' does not exist")]
    UnknownLogin(String),

    /// The addressed project or group does not exist.
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("rejected by hosting service: {0}")]
    Rejected(String),

    #[error("hosting transport error: {0}")]
    Transport(String),
}

/// The initial full-sheet read failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to read roster sheet: {message}")]
pub struct SheetReadError {
    pub message: String,
}

impl SheetReadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A status write-back failed. Always safe to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status write failed: {message}")]
pub struct TransientWriteError {
    pub message: String,
}

impl TransientWriteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A [`crate::RetryPolicy`] with an attempt cap ran out of attempts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Errors that abort a reconciliation pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Nothing can be reconciled without the roster.
    #[error(transparent)]
    Read(#[from] SheetReadError),

    /// Only reachable when the retry policy carries an attempt cap.
    #[error("row {row_index}: {source}")]
    WriteExhausted {
        row_index: usize,
        #[source]
        source: RetryExhausted<TransientWriteError>,
    },
}
