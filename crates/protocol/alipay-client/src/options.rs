//! Per-method options and notification handlers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::notify::Notification;

/// Handles verified notifications for one method.
///
/// Returning `Err` makes the acknowledgement `"error"`, so the gateway
/// redelivers the notification later. Any `Fn(Notification) -> Future`
/// closure is a handler:
///
/// ```
/// use alipay_client::{MethodOptions, Notification};
///
/// let options = MethodOptions::default()
///     .with_notify(true)
///     .with_handler(|n: Notification| async move {
///         anyhow::ensure!(n.get("trade_status").is_some(), "no trade status");
///         Ok(())
///     });
/// assert!(options.on_notify.is_some());
/// ```
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Process one notification.
    async fn handle(&self, notification: &Notification) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> NotificationHandler for F
where
    F: Fn(Notification) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, notification: &Notification) -> anyhow::Result<()> {
        (self)(notification.clone()).await
    }
}

/// Options for one API method.
///
/// Methods without an entry use [`MethodOptions::DEFAULT`]: no encryption,
/// no notify URL, no handler.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodOptions {
    /// Encrypt `biz_content` with the configured AES key.
    pub encrypt: bool,

    /// Send `notify_url = base_notify_url + "/ack/" + method`.
    pub notify: bool,

    /// Browser return address for page-redirect methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,

    /// Notification handler; code only, never read from config files.
    #[serde(skip)]
    pub on_notify: Option<Arc<dyn NotificationHandler>>,
}

impl MethodOptions {
    /// Options used for methods that were never configured.
    pub const DEFAULT: MethodOptions = MethodOptions {
        encrypt: false,
        notify: false,
        return_url: None,
        on_notify: None,
    };

    /// Set whether `biz_content` is encrypted.
    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Set whether a notify URL is sent.
    pub fn with_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    /// Set the browser return URL.
    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }

    /// Set the notification handler.
    pub fn with_handler<H: NotificationHandler + 'static>(mut self, handler: H) -> Self {
        self.on_notify = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for MethodOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodOptions")
            .field("encrypt", &self.encrypt)
            .field("notify", &self.notify)
            .field("return_url", &self.return_url)
            .field("on_notify", &self.on_notify.is_some())
            .finish()
    }
}
