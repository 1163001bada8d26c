//! Gateway response unwrapping.
//!
//! Every gateway reply wraps the business body in a method-specific key:
//!
//! ```json
//! {
//!   "alipay_trade_precreate_response": { "code": "10000", "msg": "Success", ... },
//!   "sign": "base64..."
//! }
//! ```
//!
//! [`unwrap_response`] finds the single `*_response` key regardless of the
//! method and keeps the raw JSON text of its value, because the response
//! signature is computed over that text exactly as delivered.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{WireError, WireResult};

/// Suffix of the wrapper key.
pub const RESPONSE_SUFFIX: &str = "_response";

/// Wrapper key used for gateway-level failures (bad signature, bad app id...).
pub const ERROR_RESPONSE_KEY: &str = "error_response";

/// `code` of a successful call.
pub const SUCCESS_CODE: &str = "10000";

const SIGN_KEY: &str = "sign";
const CERT_SN_KEY: &str = "alipay_cert_sn";

/// Wrapper key the gateway uses for a method.
///
/// ```
/// assert_eq!(
///     alipay_wire::response_key("alipay.trade.precreate"),
///     "alipay_trade_precreate_response"
/// );
/// ```
pub fn response_key(method: &str) -> String {
    let mut key = method.replace('.', "_");
    key.push_str(RESPONSE_SUFFIX);
    key
}

/// A structured error returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessError {
    /// Gateway error code (e.g. `"40004"`).
    pub code: String,
    /// Human-readable message.
    pub msg: String,
    /// Business sub-code (e.g. `"ACQ.TRADE_NOT_EXIST"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_code: Option<String>,
    /// Business sub-message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_msg: Option<String>,
}

impl BusinessError {
    /// Read an error out of a JSON object carrying a `code` field.
    ///
    /// The gateway sends codes as strings, but a numeric code is accepted.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let code = scalar_to_string(object.get("code")?)?;
        let text = |name: &str| object.get(name).and_then(scalar_to_string);
        Some(Self {
            code,
            msg: text("msg").unwrap_or_default(),
            sub_code: text("sub_code"),
            sub_msg: text("sub_msg"),
        })
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gateway business error {}: {}", self.code, self.msg)?;
        if let Some(sub_code) = &self.sub_code {
            write!(f, " ({}", sub_code)?;
            if let Some(sub_msg) = &self.sub_msg {
                write!(f, ": {}", sub_msg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for BusinessError {}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A successfully unwrapped gateway response.
#[derive(Debug, Clone)]
pub struct UnwrappedResponse {
    key: String,
    raw: Box<RawValue>,
    body: Value,
    sign: Option<String>,
    cert_sn: Option<String>,
}

impl UnwrappedResponse {
    /// The wrapper key that was found.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The business body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume into the business body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// The wrapped value's JSON text exactly as delivered (signature input).
    pub fn raw_body(&self) -> &str {
        self.raw.get()
    }

    /// Top-level `sign`, if the gateway signed the response.
    pub fn signature(&self) -> Option<&str> {
        self.sign.as_deref()
    }

    /// Top-level `alipay_cert_sn` (certificate mode).
    pub fn cert_sn(&self) -> Option<&str> {
        self.cert_sn.as_deref()
    }
}

/// Unwrap a raw gateway response body.
///
/// # Errors
/// - [`WireError::Business`] for an `error_response` wrapper, a wrapped
///   `code` other than `"10000"`, or an unwrapped object carrying `code`
/// - [`WireError::MalformedResponse`] when the text is not a JSON object or
///   has zero or several `*_response` keys and no error code
///
/// # Example
/// ```
/// use alipay_wire::unwrap_response;
///
/// let raw = r#"{"alipay_trade_query_response":{"code":"10000","msg":"Success","trade_status":"TRADE_SUCCESS"},"sign":"c2ln"}"#;
/// let response = unwrap_response(raw).unwrap();
/// assert_eq!(response.key(), "alipay_trade_query_response");
/// assert_eq!(response.body()["trade_status"], "TRADE_SUCCESS");
/// assert_eq!(response.signature(), Some("c2ln"));
/// ```
pub fn unwrap_response(text: &str) -> WireResult<UnwrappedResponse> {
    let top: BTreeMap<String, Box<RawValue>> = serde_json::from_str(text)
        .map_err(|e| WireError::malformed(format!("expected a JSON object: {}", e)))?;

    let mut wrapped = top
        .iter()
        .filter(|(key, _)| key.ends_with(RESPONSE_SUFFIX) && key.as_str() != ERROR_RESPONSE_KEY);

    let (key, raw) = match (wrapped.next(), wrapped.next()) {
        (Some(found), None) => found,
        (Some((first, _)), Some((second, _))) => {
            return Err(WireError::malformed(format!(
                "ambiguous response keys `{}` and `{}`",
                first, second
            )));
        }
        (None, _) => return Err(unwrapped_error(&top)),
    };

    let body: Value = serde_json::from_str(raw.get())?;
    if let Some(error) = BusinessError::from_value(&body) {
        if error.code != SUCCESS_CODE {
            return Err(error.into());
        }
    }

    let text_field = |name: &str| -> Option<String> {
        top.get(name)
            .and_then(|raw| serde_json::from_str::<String>(raw.get()).ok())
    };

    Ok(UnwrappedResponse {
        key: key.clone(),
        raw: raw.clone(),
        body,
        sign: text_field(SIGN_KEY),
        cert_sn: text_field(CERT_SN_KEY),
    })
}

/// Error for a response without a business wrapper key.
fn unwrapped_error(top: &BTreeMap<String, Box<RawValue>>) -> WireError {
    if let Some(raw) = top.get(ERROR_RESPONSE_KEY) {
        let parsed = serde_json::from_str::<Value>(raw.get()).ok();
        return match parsed.as_ref().and_then(BusinessError::from_value) {
            Some(error) => error.into(),
            None => WireError::malformed("`error_response` without a code"),
        };
    }

    // Bare error object: {"code":"40004","msg":"Business Failed"}
    let object: serde_json::Map<String, Value> = top
        .iter()
        .filter_map(|(k, raw)| {
            serde_json::from_str::<Value>(raw.get())
                .ok()
                .map(|v| (k.clone(), v))
        })
        .collect();
    match BusinessError::from_value(&Value::Object(object)) {
        Some(error) => error.into(),
        None => WireError::malformed(format!("no `*{}` key", RESPONSE_SUFFIX)),
    }
}
