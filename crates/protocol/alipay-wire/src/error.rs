//! Error types for wire-level decoding.

use thiserror::Error;

use crate::response::BusinessError;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while decoding gateway responses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WireError {
    /// Response body is not a JSON object of the expected shape.
    #[error("malformed gateway response: {reason}")]
    MalformedResponse {
        /// What was wrong with it
        reason: String,
    },

    /// The gateway answered with a structured error.
    #[error(transparent)]
    Business(#[from] BusinessError),
}

impl WireError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(e.to_string())
    }
}
