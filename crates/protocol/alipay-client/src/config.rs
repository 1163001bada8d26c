//! Client configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use alipay_crypto::{KeyMaterial, SignType};
use serde::{Deserialize, Serialize};

use crate::options::MethodOptions;

/// Production gateway endpoint.
pub const PRODUCTION_GATEWAY: &str = "https://openapi.alipay.com/gateway.do";

/// Sandbox gateway endpoint.
pub const SANDBOX_GATEWAY: &str = "https://openapi-sandbox.dl.alipaydev.com/gateway.do";

/// Only protocol version the gateway speaks.
pub const DEFAULT_VERSION: &str = "1.0";

/// Only payload format the gateway speaks.
pub const DEFAULT_FORMAT: &str = "JSON";

/// Default request charset.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Default HTTP timeout for gateway requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Offset of China Standard Time, the zone the production gateway expects.
pub const CHINA_STANDARD_OFFSET_SECS: i32 = 8 * 3600;

/// Everything the client needs to talk to the gateway.
///
/// Key material is given inline (PEM text or bare base64 DER); reading it
/// from files or the environment is left to the host application.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlipayConfig {
    /// Application id issued by the open platform.
    pub app_id: String,

    /// Application RSA private key.
    pub app_private_key: String,

    /// Application public key certificate (certificate mode).
    pub app_cert: Option<String>,

    /// Gateway public key certificate (certificate mode).
    pub gateway_cert: Option<String>,

    /// Gateway public key (public-key mode).
    pub gateway_public_key: Option<String>,

    /// Gateway root certificate bundle (certificate mode).
    pub root_cert: Option<String>,

    /// Signature algorithm.
    pub sign_type: SignType,

    /// Base64 AES-128 content key.
    pub encrypt_key: Option<String>,

    /// Third-party application authorization token.
    pub app_auth_token: Option<String>,

    /// Public base URL of the notification routes (without `/ack`).
    pub base_notify_url: Option<String>,

    /// Gateway endpoint.
    pub gateway_url: String,

    /// Request charset.
    pub charset: String,

    /// Protocol version.
    pub version: String,

    /// Payload format.
    pub format: String,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// Offset from UTC applied to the `timestamp` field, in seconds.
    pub utc_offset_secs: i32,

    /// Verify the `sign` of every gateway response.
    pub verify_response_sign: bool,

    /// Options per API method.
    pub methods: BTreeMap<String, MethodOptions>,
}

impl Default for AlipayConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_private_key: String::new(),
            app_cert: None,
            gateway_cert: None,
            gateway_public_key: None,
            root_cert: None,
            sign_type: SignType::default(),
            encrypt_key: None,
            app_auth_token: None,
            base_notify_url: None,
            gateway_url: PRODUCTION_GATEWAY.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            version: DEFAULT_VERSION.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            utc_offset_secs: 0,
            verify_response_sign: false,
            methods: BTreeMap::new(),
        }
    }
}

impl AlipayConfig {
    /// Create a sandbox configuration.
    pub fn sandbox(app_id: &str, app_private_key: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_private_key: app_private_key.to_string(),
            gateway_url: SANDBOX_GATEWAY.to_string(),
            utc_offset_secs: CHINA_STANDARD_OFFSET_SECS,
            ..Default::default()
        }
    }

    /// Create a production configuration.
    pub fn production(app_id: &str, app_private_key: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_private_key: app_private_key.to_string(),
            gateway_url: PRODUCTION_GATEWAY.to_string(),
            utc_offset_secs: CHINA_STANDARD_OFFSET_SECS,
            ..Default::default()
        }
    }

    /// HTTP timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The key material part of the configuration.
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial {
            app_private_key: self.app_private_key.clone(),
            app_cert: self.app_cert.clone(),
            gateway_cert: self.gateway_cert.clone(),
            gateway_public_key: self.gateway_public_key.clone(),
            root_cert: self.root_cert.clone(),
        }
    }
}

impl fmt::Debug for AlipayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlipayConfig")
            .field("app_id", &self.app_id)
            .field("app_private_key", &"[REDACTED]")
            .field("app_cert", &self.app_cert.is_some())
            .field("gateway_cert", &self.gateway_cert.is_some())
            .field("gateway_public_key", &self.gateway_public_key.is_some())
            .field("root_cert", &self.root_cert.is_some())
            .field("sign_type", &self.sign_type)
            .field("encrypt_key", &self.encrypt_key.as_ref().map(|_| "[REDACTED]"))
            .field("app_auth_token", &self.app_auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("base_notify_url", &self.base_notify_url)
            .field("gateway_url", &self.gateway_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("utc_offset_secs", &self.utc_offset_secs)
            .field("verify_response_sign", &self.verify_response_sign)
            .field("methods", &self.methods)
            .finish()
    }
}
