//! Gateway error types.

use alipay_client::AlipayError;
use alipay_crypto::CryptoError;
use thiserror::Error;

/// Gateway result type.
pub type AppResult<T> = Result<T, AppError>;

/// Gateway error enum wrapping all crate errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client error.
    #[error("{0}")]
    Alipay(#[from] AlipayError),

    /// Key or certificate error.
    #[error("{0}")]
    Crypto(#[from] CryptoError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// User-facing error with actionable message.
    #[error("{0}")]
    User(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Suggestion printed under the error, if any.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Alipay(e) => Some(e.suggestion()),
            Self::Crypto(_) => Some("Check the PEM file is a certificate or key in the expected format"),
            Self::Config(_) | Self::Toml(_) => Some("Check the configuration file passed with --config"),
            Self::FileNotFound(_) => Some("Paths in the configuration are relative to the configuration file"),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors: 1
            Self::User(_) => 1,
            // Not found: 2
            Self::FileNotFound(_) => 2,
            // Config errors: 3
            Self::Config(_) | Self::Toml(_) => 3,
            // Key material errors: 4
            Self::Crypto(_) => 4,
            // Gateway call errors: 5
            Self::Alipay(AlipayError::Configuration { .. }) => 3,
            Self::Alipay(_) => 5,
            // IO errors: 9
            Self::Io(_) => 9,
            // JSON/format errors: 10
            Self::Json(_) => 10,
        }
    }
}
