//! Delivery of signed envelopes to the gateway.

use std::time::Duration;

use alipay_wire::RequestEnvelope;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{AlipayError, AlipayResult};

/// Sends a signed envelope and returns the raw response body.
///
/// Implementations must not retry; the caller decides.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `envelope` to `gateway_url`.
    async fn send(&self, gateway_url: &str, envelope: &RequestEnvelope) -> AlipayResult<String>;
}

/// HTTP transport backed by `reqwest`.
///
/// Envelope fields travel as percent-encoded query parameters of a POST.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> AlipayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlipayError::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared pools, proxies).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, gateway_url: &str, envelope: &RequestEnvelope) -> AlipayResult<String> {
        debug!(
            url = %gateway_url,
            method = envelope.get(alipay_wire::fields::METHOD).unwrap_or_default(),
            "Sending request to gateway"
        );

        let response = self
            .client
            .post(gateway_url)
            .query(envelope.as_map())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Gateway returned error status");
            return Err(AlipayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
