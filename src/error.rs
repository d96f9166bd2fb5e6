//! Error types for cloudrive.

use thiserror::Error;

/// Common error type for cloudrive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Malformed input: missing required field, both-or-neither exclusive fields set.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No valid principal on the request.
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    /// Object or share absent.
    ///
    /// Rendered identically to [`DriveError::Denied`] at the HTTP boundary.
    #[error("{0} not found")]
    NotFound(String),

    /// Principal lacks a sufficient role.
    #[error("access denied: {0}")]
    Denied(String),

    /// Share link past its expiry.
    #[error("share link expired")]
    Expired,

    /// Unknown role value read from storage. Treated as a fatal misconfiguration.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Collaborator failure. Retryable by the caller, never an authorization outcome.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DriveError {
    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DriveError::Storage(_))
    }
}

impl From<sqlx::Error> for DriveError {
    fn from(e: sqlx::Error) -> Self {
        DriveError::Storage(e.to_string())
    }
}

/// Result type alias for cloudrive operations.
pub type Result<T> = std::result::Result<T, DriveError>;
