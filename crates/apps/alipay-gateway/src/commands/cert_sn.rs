//! Certificate fingerprint command.

use std::path::Path;

use alipay_crypto::{root_cert_sn, Certificate};

use crate::error::{AppError, AppResult};

/// Execute the cert-sn command.
///
/// Prints `app_cert_sn`/`alipay_cert_sn` for a single certificate, or
/// `alipay_root_cert_sn` for a root bundle.
pub fn cert_sn(file: &Path, root: bool) -> AppResult<String> {
    if !file.exists() {
        return Err(AppError::FileNotFound(file.display().to_string()));
    }
    let pem = std::fs::read_to_string(file)?;

    if root {
        Ok(root_cert_sn(&pem)?)
    } else {
        Ok(Certificate::from_pem(&pem)?.sn().to_string())
    }
}
