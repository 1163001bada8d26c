//! Mock implementation of the `Transport` trait for testing.
//!
//! Behaves like the open API gateway as far as the client can tell: it
//! checks the request signature with the application public key, decrypts
//! encrypted payloads, and answers with a gateway-signed `*_response` body.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use alipay_client::{AlipayError, AlipayResult, Transport};
use alipay_crypto::{sign, verify, AesKey, PrivateKey, PublicKey, SignType};
use alipay_wire::{fields, response_key, RequestEnvelope, ERROR_RESPONSE_KEY};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::fixtures;

/// What the mock answers for a method.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Wrap and sign this body.
    Body(Value),
    /// Return this text verbatim.
    Raw(String),
    /// Fail at the transport level.
    TransportError(String),
}

struct MockGatewayInner {
    app_public_key: PublicKey,
    gateway_key: PrivateKey,
    aes_key: Option<AesKey>,
    replies: HashMap<String, Reply>,
    /// Every envelope received, in order.
    requests: Vec<RequestEnvelope>,
    /// Decrypted `biz_content` of every request, in order.
    biz_contents: Vec<Option<String>>,
    /// Gateway URL of every request, in order.
    urls: Vec<String>,
}

/// A mock gateway implementing [`Transport`].
///
/// Uses `Arc<RwLock<...>>` internally, so clones share state: hand one clone
/// to the client and keep another for assertions.
#[derive(Clone)]
pub struct MockGateway {
    inner: Arc<RwLock<MockGatewayInner>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// A gateway trusting the fixture app key and signing with the fixture
    /// gateway key.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MockGatewayInner {
                app_public_key: PublicKey::from_pem(fixtures::APP_PUBLIC_KEY).unwrap(),
                gateway_key: PrivateKey::from_pem(fixtures::GATEWAY_PRIVATE_KEY).unwrap(),
                aes_key: None,
                replies: HashMap::new(),
                requests: Vec::new(),
                biz_contents: Vec::new(),
                urls: Vec::new(),
            })),
        }
    }

    /// Share the fixture AES key so encrypted calls can be read and answered.
    pub fn with_aes_key(self) -> Self {
        self.inner.write().unwrap().aes_key = Some(AesKey::from_base64(fixtures::AES_KEY).unwrap());
        self
    }

    /// Answer `method` with `reply`.
    pub fn with_reply(self, method: &str, reply: Reply) -> Self {
        self.set_reply(method, reply);
        self
    }

    /// Change the answer for `method` at runtime.
    pub fn set_reply(&self, method: &str, reply: Reply) {
        self.inner
            .write()
            .unwrap()
            .replies
            .insert(method.to_string(), reply);
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    /// All envelopes received.
    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.inner.read().unwrap().requests.clone()
    }

    /// The most recent envelope.
    pub fn last_request(&self) -> Option<RequestEnvelope> {
        self.inner.read().unwrap().requests.last().cloned()
    }

    /// Plaintext `biz_content` of the most recent request.
    pub fn last_biz_content(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap()
            .biz_contents
            .last()
            .cloned()
            .flatten()
    }

    /// Gateway URL of the most recent request.
    pub fn last_url(&self) -> Option<String> {
        self.inner.read().unwrap().urls.last().cloned()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.inner.read().unwrap().requests.len()
    }
}

fn invalid_signature() -> String {
    json!({
        ERROR_RESPONSE_KEY: {
            "code": "40002",
            "msg": "Invalid Arguments",
            "sub_code": "isv.invalid-signature",
            "sub_msg": "invalid signature"
        }
    })
    .to_string()
}

#[async_trait]
impl Transport for MockGateway {
    async fn send(&self, gateway_url: &str, envelope: &RequestEnvelope) -> AlipayResult<String> {
        let mut inner = self.inner.write().unwrap();
        inner.requests.push(envelope.clone());
        inner.urls.push(gateway_url.to_string());

        let sign_type: SignType = envelope
            .get(fields::SIGN_TYPE)
            .unwrap_or_default()
            .parse()
            .unwrap_or_default();
        let encrypted = envelope.get(fields::ENCRYPT_TYPE) == Some("AES");

        let biz_content = match (envelope.get(fields::BIZ_CONTENT), encrypted) {
            (Some(content), true) => inner
                .aes_key
                .as_ref()
                .and_then(|key| key.decrypt(content).ok()),
            (content, _) => content.map(str::to_string),
        };
        inner.biz_contents.push(biz_content);

        let signed = envelope.signature().is_some_and(|signature| {
            verify(
                &inner.app_public_key,
                sign_type,
                envelope.canonical_string().as_bytes(),
                signature,
            )
        });
        if !signed {
            return Ok(invalid_signature());
        }

        let method = envelope.get(fields::METHOD).unwrap_or_default();
        let body = match inner.replies.get(method).cloned() {
            Some(Reply::Raw(text)) => return Ok(text),
            Some(Reply::TransportError(reason)) => return Err(AlipayError::Transport(reason)),
            Some(Reply::Body(body)) => body,
            None => json!({"code": "10000", "msg": "Success"}),
        };

        let inner_text = match (encrypted, inner.aes_key.as_ref()) {
            (true, Some(key)) => Value::String(key.encrypt(&body.to_string())).to_string(),
            _ => body.to_string(),
        };
        let signature = sign(&inner.gateway_key, sign_type, inner_text.as_bytes())
            .map_err(|e| AlipayError::Signing(e.to_string()))?;

        Ok(format!(
            r#"{{"{}":{},"sign":"{}"}}"#,
            response_key(method),
            inner_text,
            signature
        ))
    }
}
