//! Error types for the Alipay client.

use alipay_crypto::CryptoError;
use alipay_wire::{BusinessError, WireError};
use thiserror::Error;

/// Result type for client operations.
pub type AlipayResult<T> = Result<T, AlipayError>;

/// Errors that can occur while building, sending or receiving gateway messages.
#[derive(Debug, Error)]
pub enum AlipayError {
    /// Bad or missing key material, or a feature used without its config.
    #[error("configuration error: {reason}")]
    Configuration {
        /// What is wrong with the configuration
        reason: String,
    },

    /// The request signature could not be computed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Network failure talking to the gateway.
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// The gateway did not answer within the configured timeout.
    #[error("gateway request timed out: {0}")]
    Timeout(String),

    /// The gateway answered with a non-2xx status.
    #[error("gateway returned HTTP {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body, as received
        body: String,
    },

    /// The gateway answered with a structured business error.
    #[error(transparent)]
    Business(#[from] BusinessError),

    /// The gateway answered with something that is not a valid response.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    /// Response signature missing or not matching the gateway key.
    #[error("gateway response signature verification failed: {reason}")]
    ResponseSignature {
        /// Why verification failed
        reason: String,
    },

    /// An inbound notification failed authentication or is malformed.
    #[error("notification rejected: {reason}")]
    NotificationRejected {
        /// Why the notification was rejected
        reason: String,
    },

    /// Ciphertext could not be decrypted.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// JSON (de)serialization of a business payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlipayError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> &str {
        match self {
            Self::Configuration { .. } => {
                "Check app_id, key material and encrypt_key in the client configuration"
            }
            Self::Signing(_) => "Check that app_private_key is a valid RSA private key",
            Self::Transport(_) => "Check network connectivity to the gateway",
            Self::Timeout(_) => "Retry later or increase timeout_secs",
            Self::HttpStatus { .. } => "Check gateway_url and gateway status",
            Self::Business(_) => "Inspect sub_code and sub_msg for the business reason",
            Self::InvalidResponse(_) => "Check gateway_url points at the open API gateway",
            Self::ResponseSignature { .. } => {
                "Check that the gateway certificate or public key matches the environment"
            }
            Self::NotificationRejected { .. } => {
                "Ensure notifications come from the gateway and the gateway key is correct"
            }
            Self::Decryption(_) => "Check that encrypt_key matches the key set in the console",
            Self::Serialization(_) => "Check the business payload is valid JSON",
        }
    }

    /// Returns true if this error is transient and the call may succeed on retry.
    ///
    /// The client never retries on its own; this is advice for the caller.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the HTTP status code appropriate for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotificationRejected { .. } | Self::Decryption(_) => 400,
            Self::Business(_) => 422,
            Self::Transport(_)
            | Self::HttpStatus { .. }
            | Self::InvalidResponse(_)
            | Self::ResponseSignature { .. } => 502,
            Self::Timeout(_) => 504,
            Self::Configuration { .. } | Self::Signing(_) | Self::Serialization(_) => 500,
        }
    }
}

impl From<reqwest::Error> for AlipayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<CryptoError> for AlipayError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Signing(reason) => Self::Signing(reason),
            CryptoError::Decryption(reason) => Self::Decryption(reason),
            other => Self::config(other.to_string()),
        }
    }
}

impl From<WireError> for AlipayError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Business(error) => Self::Business(error),
            WireError::MalformedResponse { reason } => Self::InvalidResponse(reason),
        }
    }
}
