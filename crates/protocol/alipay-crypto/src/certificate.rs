//! Certificate parsing and certificate serial fingerprints.
//!
//! In certificate mode the gateway identifies which public key to use by a
//! short fingerprint rather than the certificate itself:
//!
//! ```text
//! issuer  = reverse(issuer RDNs).join(",")
//! serial  = decimal(serial_number)
//! cert_sn = hex(MD5(issuer || serial))
//! ```
//!
//! The root certificate is shipped as a bundle; its fingerprint is the
//! `_`-joined fingerprints of the RSA-signed certificates in bundle order.

use num_bigint::BigUint;
use x509_cert::der::{DecodePem, Encode};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::PublicKey;

/// Separator between member fingerprints of a root bundle.
pub const ROOT_SN_SEPARATOR: &str = "_";

/// Signature algorithms whose certificates take part in the root fingerprint.
const RSA_SIGNATURE_OIDS: &[&str] = &[
    "1.2.840.113549.1.1.5",  // sha1WithRSAEncryption
    "1.2.840.113549.1.1.11", // sha256WithRSAEncryption
];

/// Compute a certificate fingerprint from an issuer string and a hex serial.
///
/// `issuer` is comma-separated in certificate (forward) order, e.g.
/// `"C=CN,O=Example,CN=Example CA"`; the components are reversed before
/// hashing.
///
/// # Example
/// ```
/// use alipay_crypto::cert_sn;
///
/// let sn = cert_sn("CN=A,O=B", "1A").unwrap();
/// assert_eq!(sn.len(), 32);
/// ```
pub fn cert_sn(issuer: &str, serial_hex: &str) -> CryptoResult<String> {
    let digits = serial_hex.trim().trim_start_matches("0x");
    let serial = BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| CryptoError::InvalidSerialNumber(serial_hex.to_string()))?;

    let components: Vec<&str> = issuer.split(',').collect();
    Ok(fingerprint(&components, &serial))
}

/// MD5 over the reversed issuer, then the decimal serial, as two updates.
fn fingerprint<S: AsRef<str>>(issuer_components: &[S], serial: &BigUint) -> String {
    let issuer = issuer_components
        .iter()
        .rev()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",");
    let serial = serial.to_str_radix(10);

    let mut context = md5::Context::new();
    context.consume(issuer.as_bytes());
    context.consume(serial.as_bytes());
    format!("{:x}", context.compute())
}

/// A parsed X.509 certificate reduced to what the SDK needs.
#[derive(Clone)]
pub struct Certificate {
    public_key: PublicKey,
    issuer: String,
    serial: String,
    sn: String,
    rsa_signed: bool,
}

impl Certificate {
    /// Parse a single PEM certificate.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        if pem.trim().is_empty() {
            return Err(CryptoError::InvalidCertificate(
                "certificate is empty".to_string(),
            ));
        }
        let cert = x509_cert::Certificate::from_pem(pem.trim().as_bytes())
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        Self::from_x509(&cert)
    }

    /// Parse every certificate in a PEM bundle, preserving order.
    pub fn load_bundle(pem: &str) -> CryptoResult<Vec<Self>> {
        // x509-cert panics on an empty chain
        if pem.trim().is_empty() {
            return Err(CryptoError::InvalidCertificate(
                "bundle contains no certificates".to_string(),
            ));
        }
        let certs = x509_cert::Certificate::load_pem_chain(pem.trim().as_bytes())
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        if certs.is_empty() {
            return Err(CryptoError::InvalidCertificate(
                "bundle contains no certificates".to_string(),
            ));
        }
        certs.iter().map(Self::from_x509).collect()
    }

    fn from_x509(cert: &x509_cert::Certificate) -> CryptoResult<Self> {
        let tbs = &cert.tbs_certificate;

        let issuer_components: Vec<String> =
            tbs.issuer.0.iter().map(|rdn| rdn.to_string()).collect();
        let serial = BigUint::from_bytes_be(tbs.serial_number.as_bytes());

        let spki = tbs
            .subject_public_key_info
            .to_der()
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let public_key =
            PublicKey::from_spki_der(&spki).map_err(CryptoError::InvalidCertificate)?;

        let algorithm = cert.signature_algorithm.oid.to_string();

        Ok(Self {
            public_key,
            sn: fingerprint(&issuer_components, &serial),
            issuer: issuer_components.join(","),
            serial: serial.to_str_radix(10),
            rsa_signed: RSA_SIGNATURE_OIDS.contains(&algorithm.as_str()),
        })
    }

    /// The subject public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The fingerprint sent as `app_cert_sn` / `alipay_cert_sn`.
    pub fn sn(&self) -> &str {
        &self.sn
    }

    /// Issuer RDNs in certificate order, comma-joined.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number in decimal.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Whether the certificate itself is signed with an RSA algorithm.
    pub fn is_rsa_signed(&self) -> bool {
        self.rsa_signed
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("issuer", &self.issuer)
            .field("serial", &self.serial)
            .field("sn", &self.sn)
            .finish()
    }
}

/// Compute `alipay_root_cert_sn` from a PEM root bundle.
///
/// Certificates signed with non-RSA algorithms (the bundle also carries
/// SM2/ECC roots) are skipped.
pub fn root_cert_sn(bundle_pem: &str) -> CryptoResult<String> {
    let sns: Vec<String> = Certificate::load_bundle(bundle_pem)?
        .into_iter()
        .filter(Certificate::is_rsa_signed)
        .map(|cert| cert.sn)
        .collect();

    if sns.is_empty() {
        return Err(CryptoError::InvalidCertificate(
            "root bundle contains no RSA-signed certificates".to_string(),
        ));
    }
    Ok(sns.join(ROOT_SN_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alipay_test_utils::fixtures;

    #[test]
    fn test_cert_sn_is_stable_lowercase_hex() {
        let sn = cert_sn("CN=A,O=B", "1A").unwrap();
        assert_eq!(sn, "e536d68a8a3bea2d67003017ec00d352");
        assert_eq!(sn, cert_sn("CN=A,O=B", "1A").unwrap());
        assert!(sn.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_cert_sn_hex_case_insensitive() {
        assert_eq!(
            cert_sn("CN=A,O=B", "1a").unwrap(),
            cert_sn("CN=A,O=B", "1A").unwrap()
        );
    }

    #[test]
    fn test_cert_sn_order_matters() {
        assert_ne!(
            cert_sn("CN=A,O=B", "1A").unwrap(),
            cert_sn("O=B,CN=A", "1A").unwrap()
        );
    }

    #[test]
    fn test_cert_sn_bad_serial() {
        assert!(matches!(
            cert_sn("CN=A", "xyz"),
            Err(CryptoError::InvalidSerialNumber(_))
        ));
    }

    #[test]
    fn test_certificate_fingerprint_matches_reference() {
        let cert = Certificate::from_pem(fixtures::APP_CERT).unwrap();
        assert_eq!(cert.sn(), fixtures::APP_CERT_SN);
        assert_eq!(cert.serial(), "85966388830387");
        assert_eq!(
            cert.issuer(),
            "C=CN,O=Sandbox Financial,OU=Certification Authority,CN=Sandbox Root CA"
        );
        assert!(cert.is_rsa_signed());
    }

    #[test]
    fn test_certificate_sn_agrees_with_string_form() {
        let cert = Certificate::from_pem(fixtures::GATEWAY_CERT).unwrap();
        let serial_hex = BigUint::parse_bytes(cert.serial().as_bytes(), 10)
            .unwrap()
            .to_str_radix(16);
        assert_eq!(cert_sn(cert.issuer(), &serial_hex).unwrap(), cert.sn());
        assert_eq!(cert.sn(), fixtures::GATEWAY_CERT_SN);
    }

    #[test]
    fn test_root_bundle_joins_rsa_members() {
        assert_eq!(root_cert_sn(fixtures::ROOT_CERT).unwrap(), fixtures::ROOT_CERT_SN);

        let bundle = format!("{}\n{}", fixtures::ROOT_CERT, fixtures::GATEWAY_CERT);
        assert_eq!(
            root_cert_sn(&bundle).unwrap(),
            format!("{}_{}", fixtures::ROOT_CERT_SN, fixtures::GATEWAY_CERT_SN)
        );
    }

    #[test]
    fn test_malformed_certificate() {
        assert!(matches!(
            Certificate::from_pem("-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----"),
            Err(CryptoError::InvalidCertificate(_))
        ));
        assert!(root_cert_sn("").is_err());
    }

    #[test]
    fn test_blank_input_is_error() {
        for blank in ["", "\n", "  \r\n\t "] {
            assert!(matches!(
                Certificate::load_bundle(blank),
                Err(CryptoError::InvalidCertificate(_))
            ));
            assert!(matches!(
                Certificate::from_pem(blank),
                Err(CryptoError::InvalidCertificate(_))
            ));
        }
    }
}
