//! Gateway configuration.
//!
//! A TOML file with three sections:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! mount = "/alipay"
//!
//! [alipay]
//! app_id = "${ALIPAY_APP_ID}"
//! app_private_key_file = "keys/app_private_key.pem"
//! app_cert_file = "keys/appCertPublicKey.crt"
//! gateway_cert_file = "keys/alipayCertPublicKey_RSA2.crt"
//! root_cert_file = "keys/alipayRootCert.crt"
//! encrypt_key_file = "keys/aes.txt"
//! base_notify_url = "https://shop.example.com/alipay"
//!
//! [alipay.methods."alipay.trade.precreate"]
//! encrypt = true
//! notify = true
//!
//! [forward]
//! url = "http://127.0.0.1:3000/payments/notify"
//! ```
//!
//! Relative `*_file` paths are resolved against the directory holding the
//! configuration file.

use std::path::{Path, PathBuf};

use alipay_client::AlipayConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "alipay-gateway.toml";

/// Expand environment variables in a string.
/// Supports `${VAR_NAME}` syntax; unset variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let Ok(re) = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}") else {
        return input.to_string();
    };
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .to_string()
}

fn expand_in_place(value: &mut String) {
    *value = expand_env_vars(value);
}

fn expand_optional(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        expand_in_place(v);
    }
}

fn expand_path(value: &mut Option<PathBuf>) {
    if let Some(path) = value.as_mut() {
        *path = PathBuf::from(expand_env_vars(&path.to_string_lossy()));
    }
}

/// Gateway configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Client configuration plus key file locations.
    pub alipay: AlipaySection,
    /// Where verified notifications are forwarded.
    pub forward: ForwardConfig,
    /// Directory that relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl GatewayConfig {
    /// Load configuration from a file.
    ///
    /// A missing file yields the default configuration. Environment
    /// variables in `${VAR}` format are expanded in string values and paths.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Parse configuration text, expanding environment variables.
    pub fn parse(contents: &str) -> AppResult<Self> {
        let mut config: Self = toml::from_str(contents)?;
        config.expand_env();
        Ok(config)
    }

    fn expand_env(&mut self) {
        expand_in_place(&mut self.server.listen);

        let alipay = &mut self.alipay;
        expand_in_place(&mut alipay.client.app_id);
        expand_in_place(&mut alipay.client.app_private_key);
        expand_in_place(&mut alipay.client.gateway_url);
        expand_optional(&mut alipay.client.encrypt_key);
        expand_optional(&mut alipay.client.app_auth_token);
        expand_optional(&mut alipay.client.base_notify_url);
        expand_path(&mut alipay.app_private_key_file);
        expand_path(&mut alipay.app_cert_file);
        expand_path(&mut alipay.gateway_cert_file);
        expand_path(&mut alipay.gateway_public_key_file);
        expand_path(&mut alipay.root_cert_file);
        expand_path(&mut alipay.encrypt_key_file);

        expand_optional(&mut self.forward.url);
        expand_optional(&mut self.forward.auth_header);
    }

    /// Resolve a configured path against [`GatewayConfig::base_dir`].
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn read_file(&self, path: &Path) -> AppResult<String> {
        let resolved = self.resolve(path);
        if !resolved.exists() {
            return Err(AppError::FileNotFound(resolved.display().to_string()));
        }
        Ok(std::fs::read_to_string(resolved)?)
    }

    /// The client configuration with every `*_file` read into place.
    ///
    /// A file takes precedence over the inline value of the same field.
    pub fn client_config(&self) -> AppResult<AlipayConfig> {
        let section = &self.alipay;
        let mut config = section.client.clone();

        if let Some(path) = &section.app_private_key_file {
            config.app_private_key = self.read_file(path)?;
        }
        if let Some(path) = &section.app_cert_file {
            config.app_cert = Some(self.read_file(path)?);
        }
        if let Some(path) = &section.gateway_cert_file {
            config.gateway_cert = Some(self.read_file(path)?);
        }
        if let Some(path) = &section.gateway_public_key_file {
            config.gateway_public_key = Some(self.read_file(path)?);
        }
        if let Some(path) = &section.root_cert_file {
            config.root_cert = Some(self.read_file(path)?);
        }
        if let Some(path) = &section.encrypt_key_file {
            config.encrypt_key = Some(self.read_file(path)?.trim().to_string());
        }

        if config.app_id.is_empty() {
            return Err(AppError::config("alipay.app_id is not set"));
        }
        if config.app_private_key.is_empty() {
            return Err(AppError::config(
                "alipay.app_private_key or alipay.app_private_key_file is required",
            ));
        }
        Ok(config)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub listen: String,
    /// Prefix for the notification, sign and encrypt routes.
    pub mount: String,
    /// Prefix for the submit and decrypt routes.
    pub unsafe_mount: String,
    /// Mount the submit and decrypt routes at all.
    ///
    /// Anyone who can reach them can spend from the merchant account and
    /// decrypt captured payloads, so they are off unless asked for.
    pub unsafe_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            mount: "/alipay".to_string(),
            unsafe_mount: "/unsafe/alipay".to_string(),
            unsafe_routes: false,
        }
    }
}

/// The `[alipay]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlipaySection {
    /// Inline client configuration.
    #[serde(flatten)]
    pub client: AlipayConfig,
    /// Application private key file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_private_key_file: Option<PathBuf>,
    /// Application public key certificate file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_cert_file: Option<PathBuf>,
    /// Gateway public key certificate file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_cert_file: Option<PathBuf>,
    /// Gateway public key file (public-key mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_public_key_file: Option<PathBuf>,
    /// Root certificate bundle file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cert_file: Option<PathBuf>,
    /// File holding the base64 AES key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypt_key_file: Option<PathBuf>,
}

/// Forwarding of verified notifications to the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Endpoint that receives each notification as JSON.
    pub url: Option<String>,
    /// Optional authorization header value (e.g., "Bearer token").
    pub auth_header: Option<String>,
    /// Methods to forward (empty = every method with `notify = true`).
    pub methods: Vec<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            url: None,
            auth_header: None,
            methods: Vec::new(),
            timeout_secs: 10,
        }
    }
}

impl ForwardConfig {
    /// Methods whose notifications are forwarded.
    pub fn forwarded_methods(&self, client: &AlipayConfig) -> Vec<String> {
        if !self.methods.is_empty() {
            return self.methods.clone();
        }
        client
            .methods
            .iter()
            .filter(|(_, options)| options.notify)
            .map(|(method, _)| method.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alipay_client::SignType;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.server.mount, "/alipay");
        assert!(!config.server.unsafe_routes);
        assert!(config.forward.url.is_none());
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("ALIPAY_GATEWAY_TEST_APP", "2021000000000000");
        assert_eq!(
            expand_env_vars("id-${ALIPAY_GATEWAY_TEST_APP}"),
            "id-2021000000000000"
        );
        assert_eq!(
            expand_env_vars("${ALIPAY_GATEWAY_TEST_UNSET_VAR}"),
            "${ALIPAY_GATEWAY_TEST_UNSET_VAR}"
        );
        assert_eq!(expand_env_vars("$PLAIN"), "$PLAIN");
    }

    #[test]
    fn test_parse_sections() {
        let config = GatewayConfig::parse(
            r#"
            [server]
            listen = "0.0.0.0:9000"
            unsafe_routes = true

            [alipay]
            app_id = "2021000000000000"
            sign_type = "RSA"
            timeout_secs = 5
            utc_offset_secs = 28800
            app_private_key_file = "keys/app.pem"

            [alipay.methods."alipay.trade.precreate"]
            encrypt = true
            notify = true

            [alipay.methods."alipay.trade.query"]
            encrypt = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.server.mount, "/alipay");
        assert!(config.server.unsafe_routes);

        let client = &config.alipay.client;
        assert_eq!(client.app_id, "2021000000000000");
        assert_eq!(client.sign_type, SignType::Rsa);
        assert_eq!(client.timeout_secs, 5);
        assert_eq!(client.utc_offset_secs, 28800);
        assert_eq!(client.charset, "utf-8");
        assert!(client.methods["alipay.trade.precreate"].notify);
        assert_eq!(
            config.alipay.app_private_key_file.as_deref(),
            Some(Path::new("keys/app.pem"))
        );

        assert_eq!(
            config.forward.forwarded_methods(client),
            vec!["alipay.trade.precreate".to_string()]
        );
    }

    #[test]
    fn test_explicit_forward_methods() {
        let config = GatewayConfig::parse(
            r#"
            [forward]
            url = "http://127.0.0.1:3000/notify"
            methods = ["alipay.open.message"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.forward.forwarded_methods(&config.alipay.client),
            vec!["alipay.open.message".to_string()]
        );
        assert_eq!(config.forward.timeout_secs, 10);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = GatewayConfig::load(Path::new("/nonexistent/alipay-gateway.toml")).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let err = GatewayConfig::parse("[server\nlisten = 1").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_client_config_requires_app_id() {
        let mut config = GatewayConfig::default();
        config.alipay.client.app_private_key = "pem".into();
        assert!(matches!(config.client_config(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_client_config_missing_key_file() {
        let mut config = GatewayConfig::default();
        config.alipay.client.app_id = "2021000000000000".into();
        config.alipay.app_private_key_file = Some(PathBuf::from("/nonexistent/app.pem"));
        assert!(matches!(
            config.client_config(),
            Err(AppError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_relative_to_base_dir() {
        let config = GatewayConfig {
            base_dir: PathBuf::from("/etc/alipay"),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(Path::new("keys/app.pem")),
            PathBuf::from("/etc/alipay/keys/app.pem")
        );
        assert_eq!(
            config.resolve(Path::new("/keys/app.pem")),
            PathBuf::from("/keys/app.pem")
        );
    }
}
