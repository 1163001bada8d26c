//! The signed request envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::canonicalize_excluding;

/// Request and notification field names.
pub mod fields {
    pub const APP_ID: &str = "app_id";
    pub const METHOD: &str = "method";
    pub const FORMAT: &str = "format";
    pub const CHARSET: &str = "charset";
    pub const SIGN_TYPE: &str = "sign_type";
    pub const SIGN: &str = "sign";
    pub const TIMESTAMP: &str = "timestamp";
    pub const VERSION: &str = "version";
    pub const APP_AUTH_TOKEN: &str = "app_auth_token";
    pub const BIZ_CONTENT: &str = "biz_content";
    pub const NOTIFY_URL: &str = "notify_url";
    pub const RETURN_URL: &str = "return_url";
    pub const APP_CERT_SN: &str = "app_cert_sn";
    pub const ALIPAY_ROOT_CERT_SN: &str = "alipay_root_cert_sn";
    pub const ALIPAY_CERT_SN: &str = "alipay_cert_sn";
    pub const ENCRYPT_TYPE: &str = "encrypt_type";
}

/// Wire format of the `timestamp` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A flat `name -> value` parameter set sent to the gateway.
///
/// Every stored value is non-empty: [`set`](Self::set) silently drops empty
/// or absent values, so the map can be serialized as-is. The map is ordered,
/// but ordering only matters for [`canonical_string`](Self::canonical_string).
///
/// # Example
/// ```
/// use alipay_wire::{fields, RequestEnvelope};
///
/// let mut envelope = RequestEnvelope::new();
/// envelope.set(fields::METHOD, Some("alipay.trade.query"));
/// envelope.set(fields::APP_ID, Some("2021000000000000"));
/// envelope.set(fields::NOTIFY_URL, None::<String>);
/// envelope.set(fields::RETURN_URL, Some(""));
///
/// assert_eq!(envelope.len(), 2);
/// assert_eq!(
///     envelope.canonical_string(),
///     "app_id=2021000000000000&method=alipay.trade.query"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct RequestEnvelope {
    fields: BTreeMap<String, String>,
}

impl RequestEnvelope {
    /// Create an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field; empty or absent values remove it instead.
    pub fn set<V: Into<String>>(&mut self, name: &str, value: Option<V>) {
        match value.map(Into::into) {
            Some(value) if !value.is_empty() => {
                self.fields.insert(name.to_string(), value);
            }
            _ => {
                self.fields.remove(name);
            }
        }
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether a field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The string that is signed: every field except `sign`.
    pub fn canonical_string(&self) -> String {
        canonicalize_excluding(&self.fields, &[fields::SIGN])
    }

    /// The `sign` field, once attached.
    pub fn signature(&self) -> Option<&str> {
        self.get(fields::SIGN)
    }

    /// Attach the signature.
    pub fn set_signature(&mut self, signature: String) {
        self.set(fields::SIGN, Some(signature));
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestEnvelope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut envelope = Self::new();
        for (name, value) in iter {
            let name = name.into();
            envelope.set(&name, Some(value));
        }
        envelope
    }
}

impl From<BTreeMap<String, String>> for RequestEnvelope {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<RequestEnvelope> for BTreeMap<String, String> {
    fn from(envelope: RequestEnvelope) -> Self {
        envelope.fields
    }
}
