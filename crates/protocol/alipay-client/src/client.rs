//! The Alipay client: request building, execution and response checks.
//!
//! Every call goes through two explicit stages:
//!
//! ```text
//! build_envelope(method, payload) -> RequestEnvelope   (sign, maybe encrypt)
//! Transport::send(envelope)       -> raw text
//! unwrap(method, raw)             -> business body     (maybe verify, decrypt)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alipay_crypto::{sign, verify, AesKey, Credentials, ENCRYPT_TYPE_AES};
use alipay_wire::{
    fields, response_key, unwrap_response, BusinessError, RequestEnvelope, UnwrappedResponse,
    SUCCESS_CODE, TIMESTAMP_FORMAT,
};
use chrono::{FixedOffset, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AlipayConfig;
use crate::error::{AlipayError, AlipayResult};
use crate::options::{MethodOptions, NotificationHandler};
use crate::transport::{HttpTransport, Transport};

static DEFAULT_OPTIONS: MethodOptions = MethodOptions::DEFAULT;

/// Client for the Alipay open API gateway.
///
/// Immutable once built and cheap to share behind an `Arc`; concurrent calls
/// do not share any mutable state.
///
/// # Example
/// ```no_run
/// # async fn example(private_key_pem: &str) -> alipay_client::AlipayResult<()> {
/// use alipay_client::{AlipayClient, AlipayConfig, MethodOptions};
/// use serde_json::json;
///
/// let mut config = AlipayConfig::sandbox("2021000000000000", private_key_pem);
/// config.base_notify_url = Some("https://shop.example/alipay".into());
///
/// let client = AlipayClient::builder(config)
///     .method("alipay.trade.precreate", MethodOptions::default().with_notify(true))
///     .build()?;
///
/// let body = client
///     .execute(
///         "alipay.trade.precreate",
///         &json!({"out_trade_no": "20150320010101001", "total_amount": "88.88", "subject": "Iphone6 16G"}),
///     )
///     .await?;
/// println!("qr code: {}", body["qr_code"]);
/// # Ok(())
/// # }
/// ```
pub struct AlipayClient {
    config: AlipayConfig,
    credentials: Credentials,
    aes_key: Option<AesKey>,
    offset: FixedOffset,
    methods: HashMap<String, MethodOptions>,
    transport: Arc<dyn Transport>,
}

/// Builder for [`AlipayClient`].
pub struct AlipayClientBuilder {
    config: AlipayConfig,
    methods: HashMap<String, MethodOptions>,
    transport: Option<Arc<dyn Transport>>,
}

impl AlipayClientBuilder {
    /// Set the options of one method, replacing any configured entry.
    pub fn method(mut self, method: &str, options: MethodOptions) -> Self {
        self.methods.insert(method.to_string(), options);
        self
    }

    /// Attach a notification handler to a method, keeping its other options.
    pub fn on_notify<H: NotificationHandler + 'static>(mut self, method: &str, handler: H) -> Self {
        let options = self
            .methods
            .remove(method)
            .or_else(|| self.config.methods.get(method).cloned())
            .unwrap_or_default();
        self.methods
            .insert(method.to_string(), options.with_handler(handler));
        self
    }

    /// Replace the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Load credentials and validate the configuration.
    ///
    /// # Errors
    /// [`AlipayError::Configuration`] when key material does not parse, the
    /// app id is empty, a method requests encryption without `encrypt_key`,
    /// or response verification is enabled without a gateway key.
    pub fn build(self) -> AlipayResult<AlipayClient> {
        let Self {
            config,
            methods: overrides,
            transport,
        } = self;

        if config.app_id.trim().is_empty() {
            return Err(AlipayError::config("app_id is empty"));
        }

        let credentials = Credentials::load(&config.key_material())?;
        let aes_key = config
            .encrypt_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(AesKey::from_base64)
            .transpose()?;

        let offset = FixedOffset::east_opt(config.utc_offset_secs).ok_or_else(|| {
            AlipayError::config(format!("utc_offset_secs {} out of range", config.utc_offset_secs))
        })?;

        let mut methods: HashMap<String, MethodOptions> = config
            .methods
            .iter()
            .map(|(name, options)| (name.clone(), options.clone()))
            .collect();
        methods.extend(overrides);

        if aes_key.is_none() {
            if let Some(method) = methods.iter().find(|(_, o)| o.encrypt).map(|(m, _)| m) {
                return Err(AlipayError::config(format!(
                    "method {} requests encryption but encrypt_key is not set",
                    method
                )));
            }
        }

        if config.verify_response_sign && credentials.gateway_public_key().is_none() {
            return Err(AlipayError::config(
                "verify_response_sign requires gateway_cert or gateway_public_key",
            ));
        }

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(config.timeout())?),
        };

        debug!(
            app_id = %config.app_id,
            cert_mode = credentials.is_cert_mode(),
            methods = methods.len(),
            "Alipay client ready"
        );

        Ok(AlipayClient {
            config,
            credentials,
            aes_key,
            offset,
            methods,
            transport,
        })
    }
}

impl AlipayClient {
    /// Start building a client.
    pub fn builder(config: AlipayConfig) -> AlipayClientBuilder {
        AlipayClientBuilder {
            config,
            methods: HashMap::new(),
            transport: None,
        }
    }

    /// Build a client with the default HTTP transport.
    pub fn new(config: AlipayConfig) -> AlipayResult<Self> {
        Self::builder(config).build()
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &AlipayConfig {
        &self.config
    }

    /// The loaded credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Options for `method`, or the defaults when it was never configured.
    pub fn method_options(&self, method: &str) -> &MethodOptions {
        self.methods.get(method).unwrap_or(&DEFAULT_OPTIONS)
    }

    /// The notification URL sent for `method`, if any.
    pub fn notify_url(&self, method: &str) -> Option<String> {
        if !self.method_options(method).notify {
            return None;
        }
        let base = self.config.base_notify_url.as_deref()?.trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!("{}/ack/{}", base, method))
    }

    /// Current time formatted for the `timestamp` field.
    pub fn timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.offset)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    /// Encrypt a payload with the configured AES key.
    pub fn encrypt(&self, plaintext: &str) -> AlipayResult<String> {
        Ok(self.aes_key()?.encrypt(plaintext))
    }

    /// Decrypt a payload with the configured AES key.
    pub fn decrypt(&self, ciphertext: &str) -> AlipayResult<String> {
        Ok(self.aes_key()?.decrypt(ciphertext)?)
    }

    fn aes_key(&self) -> AlipayResult<&AesKey> {
        self.aes_key
            .as_ref()
            .ok_or_else(|| AlipayError::config("encrypt_key is not configured"))
    }

    /// Build a signed envelope stamped with the current time.
    pub fn build_envelope<P>(&self, method: &str, payload: &P) -> AlipayResult<RequestEnvelope>
    where
        P: Serialize + ?Sized,
    {
        self.build_envelope_at(method, payload, &self.timestamp())
    }

    /// Build a signed envelope with an explicit timestamp.
    ///
    /// A payload that serializes to a JSON string is sent as that string
    /// unchanged; anything else is sent as its JSON text. A `null` payload
    /// sends no `biz_content`.
    pub fn build_envelope_at<P>(
        &self,
        method: &str,
        payload: &P,
        timestamp: &str,
    ) -> AlipayResult<RequestEnvelope>
    where
        P: Serialize + ?Sized,
    {
        let options = self.method_options(method);

        let mut biz_content = serialize_payload(payload)?;
        if options.encrypt {
            let key = self.aes_key()?;
            biz_content = biz_content.map(|plaintext| key.encrypt(&plaintext));
        }
        let encrypted = options.encrypt && biz_content.is_some();

        let mut envelope = RequestEnvelope::new();
        envelope.set(fields::APP_ID, Some(self.config.app_id.as_str()));
        envelope.set(fields::METHOD, Some(method));
        envelope.set(fields::FORMAT, Some(self.config.format.as_str()));
        envelope.set(fields::CHARSET, Some(self.config.charset.as_str()));
        envelope.set(fields::SIGN_TYPE, Some(self.config.sign_type.as_str()));
        envelope.set(fields::TIMESTAMP, Some(timestamp));
        envelope.set(fields::VERSION, Some(self.config.version.as_str()));
        envelope.set(fields::APP_AUTH_TOKEN, self.config.app_auth_token.as_deref());
        envelope.set(fields::BIZ_CONTENT, biz_content);
        envelope.set(fields::NOTIFY_URL, self.notify_url(method));
        envelope.set(fields::RETURN_URL, options.return_url.as_deref());
        envelope.set(fields::APP_CERT_SN, self.credentials.app_cert_sn());
        envelope.set(fields::ALIPAY_ROOT_CERT_SN, self.credentials.root_cert_sn());
        envelope.set(fields::ENCRYPT_TYPE, encrypted.then_some(ENCRYPT_TYPE_AES));

        let canonical = envelope.canonical_string();
        let signature = sign(
            self.credentials.private_key(),
            self.config.sign_type,
            canonical.as_bytes(),
        )?;
        envelope.set_signature(signature);

        debug!(
            method = %method,
            fields = envelope.len(),
            encrypted,
            notify = envelope.contains(fields::NOTIFY_URL),
            "Built request envelope"
        );
        Ok(envelope)
    }

    /// Sign, send and unwrap one call.
    ///
    /// # Errors
    /// Any [`AlipayError`]; gateway business failures are
    /// [`AlipayError::Business`] carrying the gateway's code and messages.
    pub async fn execute<P>(&self, method: &str, payload: &P) -> AlipayResult<Value>
    where
        P: Serialize + ?Sized,
    {
        let envelope = self.build_envelope(method, payload)?;
        let raw = self.transport.send(&self.config.gateway_url, &envelope).await?;
        self.unwrap(method, &raw)
    }

    /// [`execute`](Self::execute), deserializing the body into `T`.
    pub async fn execute_as<T, P>(&self, method: &str, payload: &P) -> AlipayResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let body = self.execute(method, payload).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Signed, percent-encoded query string for client-side SDK handoff.
    pub fn sdk_execute<P>(&self, method: &str, payload: &P) -> AlipayResult<String>
    where
        P: Serialize + ?Sized,
    {
        let envelope = self.build_envelope(method, payload)?;
        let url = url_with_envelope("http://localhost/", &envelope)?;
        Ok(url.query().unwrap_or_default().to_string())
    }

    /// Gateway URL carrying the signed envelope, for browser redirects.
    pub fn page_url<P>(&self, method: &str, payload: &P) -> AlipayResult<Url>
    where
        P: Serialize + ?Sized,
    {
        let envelope = self.build_envelope(method, payload)?;
        url_with_envelope(&self.config.gateway_url, &envelope)
    }

    /// Unwrap a raw gateway response for `method`.
    pub fn unwrap(&self, method: &str, raw: &str) -> AlipayResult<Value> {
        let response = unwrap_response(raw)?;

        let expected = response_key(method);
        if response.key() != expected {
            debug!(expected = %expected, found = %response.key(), "Unexpected response key");
        }

        if self.config.verify_response_sign {
            self.verify_response(&response)?;
        }

        match response.into_body() {
            // Encrypted responses carry the ciphertext as a JSON string
            Value::String(ciphertext) if self.method_options(method).encrypt => {
                let body: Value = serde_json::from_str(&self.decrypt(&ciphertext)?)?;
                check_code(&body)?;
                Ok(body)
            }
            body => Ok(body),
        }
    }

    /// Verify the gateway's signature over the wrapped body text.
    pub fn verify_response(&self, response: &UnwrappedResponse) -> AlipayResult<()> {
        let key = self
            .credentials
            .gateway_public_key()
            .ok_or_else(|| AlipayError::config("no gateway key to verify responses with"))?;

        let signature = response.signature().ok_or_else(|| AlipayError::ResponseSignature {
            reason: "response is not signed".to_string(),
        })?;

        if let (Some(expected), Some(received)) =
            (self.credentials.gateway_cert_sn(), response.cert_sn())
        {
            if expected != received {
                warn!(
                    expected = %expected,
                    received = %received,
                    "Gateway certificate serial differs from the configured one"
                );
            }
        }

        if verify(
            key,
            self.config.sign_type,
            response.raw_body().as_bytes(),
            signature,
        ) {
            Ok(())
        } else {
            warn!(key = %response.key(), "Gateway response signature mismatch");
            Err(AlipayError::ResponseSignature {
                reason: "signature does not match the gateway key".to_string(),
            })
        }
    }
}

/// `base` with every envelope field appended as a query parameter.
fn url_with_envelope(base: &str, envelope: &RequestEnvelope) -> AlipayResult<Url> {
    Url::parse_with_params(base, envelope.iter())
        .map_err(|e| AlipayError::config(format!("invalid URL {}: {}", base, e)))
}

impl fmt::Debug for AlipayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlipayClient")
            .field("app_id", &self.config.app_id)
            .field("gateway_url", &self.config.gateway_url)
            .field("cert_mode", &self.credentials.is_cert_mode())
            .field("encryption", &self.aes_key.is_some())
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

/// JSON text of a business payload; `None` for `null`.
fn serialize_payload<P: Serialize + ?Sized>(payload: &P) -> AlipayResult<Option<String>> {
    match serde_json::to_value(payload)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        _ => Ok(Some(serde_json::to_string(payload)?)),
    }
}

fn check_code(body: &Value) -> AlipayResult<()> {
    match BusinessError::from_value(body) {
        Some(error) if error.code != SUCCESS_CODE => Err(error.into()),
        _ => Ok(()),
    }
}
