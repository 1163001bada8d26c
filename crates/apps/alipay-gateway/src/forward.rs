//! Forwarding verified notifications to the host application.
//!
//! The gateway only knows whether a payment notification is authentic; what
//! to do with it belongs to the application behind it. Each verified
//! notification is POSTed there as JSON:
//!
//! ```json
//! {"method": "alipay.trade.precreate", "params": {...}, "biz_content": null}
//! ```
//!
//! A 2xx answer acknowledges the notification with `success`; anything else
//! answers `error` so the gateway redelivers it later.

use std::time::Duration;

use alipay_client::{Notification, NotificationHandler};
use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::config::ForwardConfig;
use crate::error::{AppError, AppResult};

/// Notification handler that POSTs each notification to a URL.
#[derive(Clone)]
pub struct ForwardHandler {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
}

impl ForwardHandler {
    /// Handler posting to `url` with the given timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("cannot build forward client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            auth_header: None,
        })
    }

    /// Handler for the `[forward]` section, if it names a URL.
    pub fn from_config(config: &ForwardConfig) -> AppResult<Option<Self>> {
        let Some(url) = config.url.as_deref().filter(|url| !url.is_empty()) else {
            return Ok(None);
        };
        let handler = Self::new(url, Duration::from_secs(config.timeout_secs))?;
        Ok(Some(match &config.auth_header {
            Some(value) => handler.with_auth_header(value),
            None => handler,
        }))
    }

    /// Send `Authorization: <value>` with every request.
    pub fn with_auth_header(mut self, value: impl Into<String>) -> Self {
        self.auth_header = Some(value.into());
        self
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationHandler for ForwardHandler {
    async fn handle(&self, notification: &Notification) -> anyhow::Result<()> {
        let mut request = self.client.post(&self.url).json(notification);
        if let Some(auth) = &self.auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("forwarding to {}", self.url))?;
        let status = response.status();
        anyhow::ensure!(
            status.is_success(),
            "{} answered {}",
            self.url,
            status
        );

        debug!(method = %notification.method, status = %status, "Notification forwarded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_from_config_requires_url() {
        assert!(ForwardHandler::from_config(&ForwardConfig::default())
            .unwrap()
            .is_none());

        let config = ForwardConfig {
            url: Some(String::new()),
            ..Default::default()
        };
        assert!(ForwardHandler::from_config(&config).unwrap().is_none());

        let config = ForwardConfig {
            url: Some("http://127.0.0.1:3000/notify".into()),
            auth_header: Some("Bearer t".into()),
            ..Default::default()
        };
        let handler = ForwardHandler::from_config(&config).unwrap().unwrap();
        assert_eq!(handler.url(), "http://127.0.0.1:3000/notify");
        assert_eq!(handler.auth_header.as_deref(), Some("Bearer t"));
    }

    #[tokio::test]
    async fn test_unreachable_target_fails() {
        // Port 9 (discard) is closed on test hosts; the connect is refused.
        let handler =
            ForwardHandler::new("http://127.0.0.1:9/notify", Duration::from_secs(2)).unwrap();
        let notification = Notification::new("alipay.trade.precreate", BTreeMap::new(), None);
        assert!(handler.handle(&notification).await.is_err());
    }

    #[tokio::test]
    async fn test_configured_timeout_applies() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let config = ForwardConfig {
            url: Some(format!("http://{}/notify", addr)),
            timeout_secs: 1,
            ..Default::default()
        };
        let handler = ForwardHandler::from_config(&config).unwrap().unwrap();
        let notification = Notification::new("alipay.trade.precreate", BTreeMap::new(), None);

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            handler.handle(&notification),
        )
        .await
        .expect("forward request outlived its configured timeout");
        assert!(result.is_err());
    }
}
