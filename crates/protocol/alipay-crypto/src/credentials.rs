//! The credential store: every key the SDK signs or verifies with.

use std::sync::Arc;

use crate::certificate::{root_cert_sn, Certificate};
use crate::error::CryptoResult;
use crate::keys::{PrivateKey, PublicKey};

/// Raw key material as supplied by the host application.
///
/// Only `app_private_key` is mandatory. When both `gateway_cert` and
/// `gateway_public_key` are given, the certificate wins.
#[derive(Clone, Default)]
pub struct KeyMaterial {
    /// Application private key (PEM or bare base64 DER).
    pub app_private_key: String,
    /// Application public key certificate (certificate mode).
    pub app_cert: Option<String>,
    /// Gateway public key certificate (certificate mode).
    pub gateway_cert: Option<String>,
    /// Gateway public key (public-key mode).
    pub gateway_public_key: Option<String>,
    /// Gateway root certificate bundle (certificate mode).
    pub root_cert: Option<String>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("app_private_key", &"[REDACTED]")
            .field("app_cert", &self.app_cert.is_some())
            .field("gateway_cert", &self.gateway_cert.is_some())
            .field("gateway_public_key", &self.gateway_public_key.is_some())
            .field("root_cert", &self.root_cert.is_some())
            .finish()
    }
}

/// Parsed, immutable credentials.
///
/// Fingerprints are computed once here and reused for every request.
#[derive(Debug, Clone)]
pub struct Credentials {
    private_key: PrivateKey,
    app_public_key: Option<PublicKey>,
    app_cert_sn: Option<String>,
    gateway_public_key: Option<Arc<PublicKey>>,
    gateway_cert_sn: Option<String>,
    root_cert_sn: Option<String>,
}

impl Credentials {
    /// Parse all supplied key material.
    ///
    /// Fails on the first malformed input; a credential store is never
    /// returned half-loaded.
    pub fn load(material: &KeyMaterial) -> CryptoResult<Self> {
        let private_key = PrivateKey::from_pem(&material.app_private_key)?;

        let (app_public_key, app_cert_sn) = match material.app_cert.as_deref() {
            Some(pem) => {
                let cert = Certificate::from_pem(pem)?;
                (Some(cert.public_key().clone()), Some(cert.sn().to_string()))
            }
            None => (None, None),
        };

        let (gateway_public_key, gateway_cert_sn) = match (
            material.gateway_cert.as_deref(),
            material.gateway_public_key.as_deref(),
        ) {
            (Some(pem), _) => {
                let cert = Certificate::from_pem(pem)?;
                (
                    Some(Arc::new(cert.public_key().clone())),
                    Some(cert.sn().to_string()),
                )
            }
            (None, Some(pem)) => (Some(Arc::new(PublicKey::from_pem(pem)?)), None),
            (None, None) => (None, None),
        };

        let root_cert_sn = material
            .root_cert
            .as_deref()
            .map(root_cert_sn)
            .transpose()?;

        Ok(Self {
            private_key,
            app_public_key,
            app_cert_sn,
            gateway_public_key,
            gateway_cert_sn,
            root_cert_sn,
        })
    }

    /// Credentials with only a private key (no certificates, no gateway key).
    pub fn from_private_key(private_key: PrivateKey) -> Self {
        Self {
            private_key,
            app_public_key: None,
            app_cert_sn: None,
            gateway_public_key: None,
            gateway_cert_sn: None,
            root_cert_sn: None,
        }
    }

    /// The application signing key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The application public key from `app_cert`, if one was given.
    pub fn app_public_key(&self) -> Option<&PublicKey> {
        self.app_public_key.as_ref()
    }

    /// `app_cert_sn` request field.
    pub fn app_cert_sn(&self) -> Option<&str> {
        self.app_cert_sn.as_deref()
    }

    /// The gateway verification key, shared read-only.
    pub fn gateway_public_key(&self) -> Option<&Arc<PublicKey>> {
        self.gateway_public_key.as_ref()
    }

    /// Fingerprint of the gateway certificate.
    pub fn gateway_cert_sn(&self) -> Option<&str> {
        self.gateway_cert_sn.as_deref()
    }

    /// `alipay_root_cert_sn` request field.
    pub fn root_cert_sn(&self) -> Option<&str> {
        self.root_cert_sn.as_deref()
    }

    /// Whether the store was loaded in certificate mode.
    pub fn is_cert_mode(&self) -> bool {
        self.app_cert_sn.is_some()
    }
}
