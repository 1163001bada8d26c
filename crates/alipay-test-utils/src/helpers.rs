//! Helper functions for creating test configurations and notifications.

use std::collections::BTreeMap;

use alipay_client::AlipayConfig;
use alipay_crypto::{sign, PrivateKey, SignType};
use alipay_wire::{canonicalize_excluding, fields};
use reqwest::Url;

use crate::fixtures;

/// App id used throughout the tests.
pub const TEST_APP_ID: &str = "2021000000000000";

/// Base notify URL used throughout the tests.
pub const TEST_NOTIFY_BASE: &str = "https://x.test";

/// Gateway URL used with the mock transport.
pub const TEST_GATEWAY_URL: &str = "https://gateway.test/gateway.do";

/// Public-key mode configuration with encryption available.
pub fn test_config() -> AlipayConfig {
    AlipayConfig {
        app_id: TEST_APP_ID.to_string(),
        app_private_key: fixtures::APP_PRIVATE_KEY.to_string(),
        gateway_public_key: Some(fixtures::GATEWAY_PUBLIC_KEY.to_string()),
        encrypt_key: Some(fixtures::AES_KEY.to_string()),
        base_notify_url: Some(TEST_NOTIFY_BASE.to_string()),
        gateway_url: TEST_GATEWAY_URL.to_string(),
        ..Default::default()
    }
}

/// Certificate mode configuration with encryption available.
pub fn test_cert_config() -> AlipayConfig {
    AlipayConfig {
        app_cert: Some(fixtures::APP_CERT.to_string()),
        gateway_cert: Some(fixtures::GATEWAY_CERT.to_string()),
        root_cert: Some(fixtures::ROOT_CERT.to_string()),
        gateway_public_key: None,
        ..test_config()
    }
}

/// Sign a notification form the way the gateway does (RSA2, gateway key).
///
/// Any existing `sign` is replaced.
pub fn sign_notification(mut params: BTreeMap<String, String>) -> BTreeMap<String, String> {
    let key = PrivateKey::from_pem(fixtures::GATEWAY_PRIVATE_KEY).unwrap();
    let canonical = canonicalize_excluding(&params, &[fields::SIGN]);
    let signature = sign(&key, SignType::Rsa2, canonical.as_bytes()).unwrap();
    params.insert(fields::SIGN.to_string(), signature);
    params
}

/// A signed `TRADE_SUCCESS` notification for `out_trade_no`.
pub fn trade_success_notification(out_trade_no: &str) -> BTreeMap<String, String> {
    let params = [
        ("app_id", TEST_APP_ID),
        ("charset", "utf-8"),
        ("gmt_payment", "2024-01-02 03:04:05"),
        ("notify_id", "2024010200222030405000000000000001"),
        ("notify_time", "2024-01-02 03:04:06"),
        ("notify_type", "trade_status_sync"),
        ("out_trade_no", out_trade_no),
        ("sign_type", "RSA2"),
        ("total_amount", "88.88"),
        ("trade_no", "2024010222001400000000000001"),
        ("trade_status", "TRADE_SUCCESS"),
        ("version", "1.0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    sign_notification(params)
}

/// URL-encode a form for posting to the notification route.
pub fn form_body(params: &BTreeMap<String, String>) -> String {
    let url = Url::parse_with_params("http://localhost/", params).unwrap();
    url.query().unwrap_or_default().to_string()
}
