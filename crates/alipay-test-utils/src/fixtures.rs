//! Fixed key material and reference values.
//!
//! The keys, the test root CA and the certificates issued from it were
//! generated with OpenSSL. Every `REFERENCE_*` / `*_SN` value was computed
//! outside this workspace so that the SDK is checked byte-for-byte.

/// App private key, PKCS#8 PEM (RSA-2048).
pub const APP_PRIVATE_KEY: &str = include_str!("../fixtures/app_private_key.pem");

/// The same app private key, PKCS#1 PEM.
pub const APP_PRIVATE_KEY_PKCS1: &str = include_str!("../fixtures/app_private_key_pkcs1.pem");

/// App public key, SPKI PEM.
pub const APP_PUBLIC_KEY: &str = include_str!("../fixtures/app_public_key.pem");

/// App public key certificate issued by the test root.
pub const APP_CERT: &str = include_str!("../fixtures/app_cert.pem");

/// Gateway private key; only tests hold it, to sign responses and notifications.
pub const GATEWAY_PRIVATE_KEY: &str = include_str!("../fixtures/gateway_private_key.pem");

/// Gateway public key, SPKI PEM.
pub const GATEWAY_PUBLIC_KEY: &str = include_str!("../fixtures/gateway_public_key.pem");

/// Gateway public key certificate issued by the test root.
pub const GATEWAY_CERT: &str = include_str!("../fixtures/gateway_cert.pem");

/// Self-signed test root certificate.
pub const ROOT_CERT: &str = include_str!("../fixtures/root_cert.pem");

/// Base64 AES-128 content key.
pub const AES_KEY: &str = "7zB7zoZNXwQGWzFrYaUcAg==";

/// Fingerprint of [`APP_CERT`].
pub const APP_CERT_SN: &str = "1e70166fc96eec9f09d37260e042f755";

/// Fingerprint of [`GATEWAY_CERT`].
pub const GATEWAY_CERT_SN: &str = "bbaf0954d02259159a69c8d2d679312a";

/// Fingerprint of [`ROOT_CERT`] as a one-member bundle.
pub const ROOT_CERT_SN: &str = "8fd2fc231127d68e62be699c18e5dcaf";

/// A canonical parameter string.
pub const REFERENCE_CANONICAL: &str =
    r#"app_id=2021000000000000&biz_content={"a":"b"}&charset=utf-8&method=alipay.trade.query&sign_type=RSA2&timestamp=2024-01-02 03:04:05&version=1.0"#;

/// `RSA2` signature of [`REFERENCE_CANONICAL`] under [`APP_PRIVATE_KEY`].
pub const REFERENCE_RSA2_SIGNATURE: &str = "1/++ScRUBBfu/mhk6JKkoEwQ99qwt1e+LhZ0Y4NrEbhITIvQV9v/SQp2faDv73VYAZ1CCNgbTI75RZAHKSdHWL8QBd1wVijfMzdohnpCw8H+C/mHTEAfd7LwZzVBX8r1PSetxpSjSpOHOjhsHlb32fwTRRaJMgUJ6xoKXDS+EUez8tx1gxzn95GObORpiFa/rni6s78lAgb+GOnRR0Enyp4E6KAEJteDQU+q8bPxX4qq58oIoa+w8R6vLHmv7/6r64SVBRsebDlQRoNryF93CiUiQu91CLsvjDrG8d33SxpCUapABwxaSr7JFyKWX4gytGGn5mqOvLTZuLnQL4UrIQ==";

/// `RSA` signature of [`REFERENCE_CANONICAL`] under [`APP_PRIVATE_KEY`].
pub const REFERENCE_RSA_SIGNATURE: &str = "ClrAbKzyF3YwiX6AVdO44CXxZYYjFUuS2lUbXGXX+aNZr63kWH5zHOBxCgvtVUICKxxgwfSe8GgkSkKLvVw/xu0VfWv58PCWLhBvc2jAfPjaHBx658suczUI6P5vOglfNDAJwyFqkyuRHPN+Ni8LfBbW3lN9FczksFXNKtnSYnteCxNiZI2gIRWDsgGg6Rj4RH5GChnHFc0hcujzfpbL8OSYnke4ubKA2moR3xlb5C88+R5QzwCC/IcIlbYFG6l/wclPacYY4lOY/nZwJks8C+4FffpjTPiV755UT/WWw/JWDLQ1+q5WA8vJ1CdKHTgYNQzsVAohcevYrCq5QegGQw==";

/// A business payload.
pub const REFERENCE_BIZ_CONTENT: &str =
    r#"{"out_trade_no":"20150320010101001","total_amount":"88.88","subject":"Iphone6 16G"}"#;

/// [`REFERENCE_BIZ_CONTENT`] encrypted under [`AES_KEY`].
pub const REFERENCE_BIZ_CIPHERTEXT: &str = "Xx9MM5gH0Bc+23QuC8QDM8BMmnzeDuYHiVBScZpSURrFOYpeQupdj+Qtd2+iKCM3Nuhyho1Hom/erWsWKNy3DEiHYlLr/8ssdQo0xzQyP4C/c2ilCN552UQWiCji7P+a";

/// The empty string encrypted under [`AES_KEY`] (one block of padding).
pub const REFERENCE_EMPTY_CIPHERTEXT: &str = "IE9ZAfBkYU39zngBZIfxOQ==";

#[cfg(test)]
mod tests {
    use super::*;
    use alipay_crypto::AesKey;

    #[test]
    fn test_aes_key_decrypts_reference_ciphertext() {
        let key = AesKey::from_base64(AES_KEY).unwrap();
        assert_eq!(
            key.decrypt(REFERENCE_BIZ_CIPHERTEXT).unwrap(),
            REFERENCE_BIZ_CONTENT
        );
    }
}
