//! Error types for alipay-crypto

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while loading key material or running a cipher.
///
/// Signature *verification* never produces one of these: a bad signature is
/// reported as `false` by [`crate::verify`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The application private key could not be parsed.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// A public key could not be parsed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A certificate (or certificate bundle) could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// A certificate serial number is not a valid hex integer.
    #[error("invalid certificate serial number: {0}")]
    InvalidSerialNumber(String),

    /// The signature type string is not one of `RSA2` / `RSA`.
    #[error("unsupported signature type: {0}")]
    UnsupportedSignType(String),

    /// RSA signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The symmetric key is not base64 or not 128 bits long.
    #[error("invalid symmetric key: {0}")]
    InvalidSymmetricKey(String),

    /// Ciphertext could not be decoded, unpadded or read as UTF-8.
    #[error("decryption failed: {0}")]
    Decryption(String),
}
