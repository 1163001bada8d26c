//! Signature creation and verification.
//!
//! Requests are signed with RSASSA-PKCS1-v1_5 over the canonical parameter
//! string:
//! ```text
//! sign = base64(RSA_Sign(app_private_key, H(canonical)))
//! H    = SHA-256 for "RSA2", SHA-1 for legacy "RSA"
//! ```

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rsa::Pkcs1v15Sign;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{PrivateKey, PublicKey};

/// The `sign_type` request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignType {
    /// SHA256withRSA.
    #[default]
    #[serde(rename = "RSA2")]
    Rsa2,
    /// SHA1withRSA, kept for applications registered before RSA2.
    #[serde(rename = "RSA")]
    Rsa,
}

impl SignType {
    /// The wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa2 => "RSA2",
            Self::Rsa => "RSA",
        }
    }
}

impl fmt::Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RSA2" => Ok(Self::Rsa2),
            "RSA" => Ok(Self::Rsa),
            other => Err(CryptoError::UnsupportedSignType(other.to_string())),
        }
    }
}

/// Sign a message, returning the base64 signature.
///
/// # Example
/// ```
/// # fn example(key: &alipay_crypto::PrivateKey) -> alipay_crypto::CryptoResult<()> {
/// use alipay_crypto::{sign, verify, SignType};
///
/// let message = b"app_id=2021000000000000&method=alipay.trade.query";
/// let signature = sign(key, SignType::Rsa2, message)?;
/// assert!(verify(&key.public_key(), SignType::Rsa2, message, &signature));
/// # Ok(())
/// # }
/// ```
pub fn sign(private_key: &PrivateKey, sign_type: SignType, message: &[u8]) -> CryptoResult<String> {
    let signature = match sign_type {
        SignType::Rsa2 => private_key
            .0
            .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(message)),
        SignType::Rsa => private_key
            .0
            .sign(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(message)),
    }
    .map_err(|e| CryptoError::Signing(e.to_string()))?;

    Ok(STANDARD.encode(signature))
}

/// Verify a base64 signature against a public key and message.
///
/// # Returns
/// `true` only if the signature decodes and matches. Malformed base64 and
/// wrong keys are `false`, never an error.
pub fn verify(public_key: &PublicKey, sign_type: SignType, message: &[u8], signature: &str) -> bool {
    let compact: String = signature.split_whitespace().collect();
    let Ok(raw) = STANDARD.decode(compact) else {
        return false;
    };

    let result = match sign_type {
        SignType::Rsa2 => public_key.0.verify(
            Pkcs1v15Sign::new::<Sha256>(),
            &Sha256::digest(message),
            &raw,
        ),
        SignType::Rsa => {
            public_key
                .0
                .verify(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(message), &raw)
        }
    };
    result.is_ok()
}
