//! Shared error type across agri-food crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed config.
    BadRequest,
    /// Metric registered twice with different shapes.
    Conflict,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Conflict => "CONFLICT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AgriFoodError>;

/// Unified error type used by core and api.
#[derive(Debug, Error)]
pub enum AgriFoodError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("label mismatch on {metric}: expected {expected} values, got {got}")]
    LabelMismatch {
        metric: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AgriFoodError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            AgriFoodError::BadRequest(_)
            | AgriFoodError::InvalidName(_)
            | AgriFoodError::InvalidBuckets(_)
            | AgriFoodError::LabelMismatch { .. }
            | AgriFoodError::InvalidValue(_) => ClientCode::BadRequest,
            AgriFoodError::Conflict(_) => ClientCode::Conflict,
            AgriFoodError::Internal(_) => ClientCode::Internal,
        }
    }
}
