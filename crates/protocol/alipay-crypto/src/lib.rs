//! Cryptographic primitives for the Alipay open API.
//!
//! This crate provides everything the SDK signs, verifies or encrypts with:
//!
//! - **Keys**: RSA private/public key loading from PEM or bare base64 DER
//! - **Certificates**: X.509 parsing and the `*_cert_sn` fingerprints
//! - **Signatures**: `RSA2` (SHA256withRSA) and legacy `RSA` (SHA1withRSA)
//! - **Cipher**: `AES/CBC/PKCS5Padding` for `biz_content`
//! - **Credentials**: the immutable store combining all of the above
//!
//! # Example
//!
//! ```
//! use alipay_crypto::{cert_sn, AesKey};
//!
//! // Certificate fingerprint from issuer + hex serial
//! let sn = cert_sn("CN=A,O=B", "1A").unwrap();
//! assert_eq!(sn.len(), 32);
//!
//! // Payload encryption
//! let key = AesKey::from_bytes([0x42; 16]);
//! let ciphertext = key.encrypt("{}");
//! assert_eq!(key.decrypt(&ciphertext).unwrap(), "{}");
//! ```

mod certificate;
mod cipher;
mod credentials;
mod error;
mod keys;
mod signature;

pub use certificate::{cert_sn, root_cert_sn, Certificate, ROOT_SN_SEPARATOR};
pub use cipher::{AesKey, AES_ALGORITHM, ENCRYPT_TYPE_AES};
pub use credentials::{Credentials, KeyMaterial};
pub use error::{CryptoError, CryptoResult};
pub use keys::{PrivateKey, PublicKey};
pub use signature::{sign, verify, SignType};
