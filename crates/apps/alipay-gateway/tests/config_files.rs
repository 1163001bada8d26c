//! Loading a configuration file that points at key files on disk.

use std::fs;

use alipay_client::SignType;
use alipay_gateway::commands::build_client;
use alipay_gateway::{AppError, GatewayConfig};
use alipay_test_utils::fixtures;
use tempfile::TempDir;

fn write_keys(dir: &TempDir) {
    let keys = dir.path().join("keys");
    fs::create_dir_all(&keys).unwrap();
    fs::write(keys.join("app_private_key.pem"), fixtures::APP_PRIVATE_KEY).unwrap();
    fs::write(keys.join("app.crt"), fixtures::APP_CERT).unwrap();
    fs::write(keys.join("gateway.crt"), fixtures::GATEWAY_CERT).unwrap();
    fs::write(keys.join("root.crt"), fixtures::ROOT_CERT).unwrap();
    fs::write(keys.join("aes.txt"), format!("{}\n", fixtures::AES_KEY)).unwrap();
}

#[test]
fn cert_mode_from_files() {
    let dir = TempDir::new().unwrap();
    write_keys(&dir);
    std::env::set_var("ALIPAY_GATEWAY_FILES_TEST_APP_ID", "2021000000000000");

    let path = dir.path().join("alipay-gateway.toml");
    fs::write(
        &path,
        r#"
        [server]
        listen = "127.0.0.1:0"

        [alipay]
        app_id = "${ALIPAY_GATEWAY_FILES_TEST_APP_ID}"
        sign_type = "RSA2"
        app_private_key_file = "keys/app_private_key.pem"
        app_cert_file = "keys/app.crt"
        gateway_cert_file = "keys/gateway.crt"
        root_cert_file = "keys/root.crt"
        encrypt_key_file = "keys/aes.txt"
        base_notify_url = "https://shop.test/alipay"

        [alipay.methods."alipay.trade.precreate"]
        encrypt = true
        notify = true
        "#,
    )
    .unwrap();

    let config = GatewayConfig::load(&path).unwrap();
    assert_eq!(config.base_dir, dir.path());

    let client_config = config.client_config().unwrap();
    assert_eq!(client_config.app_id, "2021000000000000");
    assert_eq!(client_config.sign_type, SignType::Rsa2);
    assert_eq!(client_config.encrypt_key.as_deref(), Some(fixtures::AES_KEY));

    let client = build_client(&config).unwrap();
    assert_eq!(client.credentials().app_cert_sn(), Some(fixtures::APP_CERT_SN));
    assert_eq!(
        client.credentials().root_cert_sn(),
        Some(fixtures::ROOT_CERT_SN)
    );

    let envelope = client
        .build_envelope("alipay.trade.precreate", &serde_json::json!({"subject": "t"}))
        .unwrap();
    assert_eq!(envelope.get("encrypt_type"), Some("AES"));
    assert_eq!(
        envelope.get("notify_url"),
        Some("https://shop.test/alipay/ack/alipay.trade.precreate")
    );
}

#[test]
fn missing_key_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("alipay-gateway.toml");
    fs::write(
        &path,
        r#"
        [alipay]
        app_id = "2021000000000000"
        app_private_key_file = "keys/missing.pem"
        "#,
    )
    .unwrap();

    let config = GatewayConfig::load(&path).unwrap();
    let err = config.client_config().unwrap_err();
    assert!(matches!(err, AppError::FileNotFound(ref p) if p.ends_with("missing.pem")));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn encrypting_method_without_key_fails_at_build() {
    let dir = TempDir::new().unwrap();
    write_keys(&dir);
    let path = dir.path().join("alipay-gateway.toml");
    fs::write(
        &path,
        r#"
        [alipay]
        app_id = "2021000000000000"
        app_private_key_file = "keys/app_private_key.pem"

        [alipay.methods."alipay.trade.precreate"]
        encrypt = true
        "#,
    )
    .unwrap();

    let config = GatewayConfig::load(&path).unwrap();
    let err = build_client(&config).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
