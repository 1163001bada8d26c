//! Asynchronous notifications (webhooks).
//!
//! The gateway POSTs a signed form to `notify_url` and redelivers it until
//! the response body is the literal `success`. Processing is:
//!
//! 1. verify `sign` over the canonical string of every other field
//! 2. decrypt `biz_content` when the method or the form asks for it
//! 3. run the method's handler; its outcome picks the acknowledgement

use std::collections::BTreeMap;
use std::fmt;

use alipay_crypto::{verify, ENCRYPT_TYPE_AES};
use alipay_wire::{canonicalize_excluding, fields};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::AlipayClient;
use crate::error::{AlipayError, AlipayResult};

/// Acknowledgement body returned to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Handled; stop redelivery.
    Success,
    /// Not handled; the gateway will redeliver.
    Error,
}

impl Ack {
    /// The literal response body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Method the notification was delivered for (the `/ack/:method` segment).
    pub method: String,
    /// Every posted field except `sign`.
    pub params: BTreeMap<String, String>,
    /// `biz_content`, decrypted when it arrived encrypted.
    pub biz_content: Option<String>,
}

impl Notification {
    /// Assemble a notification from already verified parts.
    pub fn new(
        method: impl Into<String>,
        params: BTreeMap<String, String>,
        biz_content: Option<String>,
    ) -> Self {
        Self {
            method: method.into(),
            params,
            biz_content,
        }
    }

    /// Look up a posted field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parse `biz_content` as JSON.
    pub fn biz_content_as<T: DeserializeOwned>(&self) -> AlipayResult<Option<T>> {
        self.biz_content
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(AlipayError::from)
    }
}

impl AlipayClient {
    /// Check the gateway signature of a posted form.
    ///
    /// Pure: never mutates anything, and `false` on any doubt (no gateway
    /// key, no `sign`, mismatch).
    pub fn verify_notification(&self, params: &BTreeMap<String, String>) -> bool {
        let Some(key) = self.credentials().gateway_public_key() else {
            warn!("No gateway key configured; rejecting notification");
            return false;
        };
        let Some(signature) = params.get(fields::SIGN) else {
            return false;
        };

        let canonical = canonicalize_excluding(params, &[fields::SIGN]);
        verify(key, self.config().sign_type, canonical.as_bytes(), signature)
    }

    /// Verify a posted form and turn it into a [`Notification`].
    ///
    /// # Errors
    /// - [`AlipayError::NotificationRejected`] when the signature does not verify
    /// - [`AlipayError::Decryption`] / [`AlipayError::Configuration`] when
    ///   `biz_content` must be decrypted and cannot be
    pub fn accept_notification(
        &self,
        method: &str,
        mut params: BTreeMap<String, String>,
    ) -> AlipayResult<Notification> {
        if !self.verify_notification(&params) {
            warn!(method = %method, "Notification signature verification failed");
            return Err(AlipayError::NotificationRejected {
                reason: "signature verification failed".to_string(),
            });
        }
        params.remove(fields::SIGN);

        let encrypted = self.method_options(method).encrypt
            || params.get(fields::ENCRYPT_TYPE).map(String::as_str) == Some(ENCRYPT_TYPE_AES);

        let biz_content = match params.get(fields::BIZ_CONTENT) {
            Some(content) if encrypted => Some(self.decrypt(content)?),
            Some(content) => Some(content.clone()),
            None => None,
        };

        Ok(Notification::new(method, params, biz_content))
    }

    /// Verify, decrypt and hand a notification to its handler.
    ///
    /// Returns the acknowledgement to send back. Handler failures are
    /// [`Ack::Error`], not `Err`; `Err` means the notification itself was
    /// unacceptable and the handler never ran.
    pub async fn dispatch_notification(
        &self,
        method: &str,
        params: BTreeMap<String, String>,
    ) -> AlipayResult<Ack> {
        let notification = self.accept_notification(method, params)?;

        let Some(handler) = self.method_options(method).on_notify.clone() else {
            debug!(method = %method, "No handler registered; acknowledging");
            return Ok(Ack::Success);
        };

        match handler.handle(&notification).await {
            Ok(()) => {
                info!(
                    method = %method,
                    notify_id = notification.get("notify_id").unwrap_or_default(),
                    "Notification handled"
                );
                Ok(Ack::Success)
            }
            Err(e) => {
                warn!(method = %method, error = %format!("{:#}", e), "Notification handler failed");
                Ok(Ack::Error)
            }
        }
    }
}
