//! HTTP routes.
//!
//! Safe prefix (default `/alipay`):
//!
//! - `POST /ack/:method`: gateway notification; answers `success` or `error`
//! - `POST /sign/:method`: JSON payload in, signed envelope out (not sent)
//! - `POST /encrypt`: raw text in, base64 ciphertext out
//!
//! Unsafe prefix (default `/unsafe/alipay`, only when enabled):
//!
//! - `POST /submit/:method`: JSON payload in, unwrapped gateway response out
//! - `POST /decrypt`: base64 ciphertext in, plaintext out
//!
//! Failures answer with a bare status code. The one exception is a gateway
//! business error from `/submit`, whose code and sub-code are returned as
//! JSON with 422 because they come from the gateway, not from us.

use std::collections::BTreeMap;
use std::sync::Arc;

use alipay_client::{AlipayClient, AlipayError};
use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<AlipayClient>,
}

/// Where the two route groups are mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mounts {
    /// Prefix for notification, sign and encrypt.
    pub safe: String,
    /// Prefix for submit and decrypt; `None` leaves them unmounted.
    pub unsafe_: Option<String>,
}

impl Default for Mounts {
    fn default() -> Self {
        Self {
            safe: "/alipay".to_string(),
            unsafe_: None,
        }
    }
}

impl Mounts {
    /// Mount points from the `[server]` section.
    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        let safe = normalize_prefix(&config.mount);
        let unsafe_ = config
            .unsafe_routes
            .then(|| normalize_prefix(&config.unsafe_mount));
        if unsafe_.as_deref() == Some(safe.as_str()) {
            return Err(AppError::config(
                "server.unsafe_mount must differ from server.mount",
            ));
        }
        Ok(Self { safe, unsafe_ })
    }
}

/// `"alipay/"` -> `"/alipay"`, `"/"` -> `""`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn mount(parent: Router<AppState>, prefix: &str, child: Router<AppState>) -> Router<AppState> {
    let prefix = normalize_prefix(prefix);
    if prefix.is_empty() {
        parent.merge(child)
    } else {
        parent.nest(&prefix, child)
    }
}

/// Build the router.
pub fn router(client: Arc<AlipayClient>, mounts: &Mounts) -> Router {
    let safe = Router::new()
        .route("/ack/:method", post(ack))
        .route("/sign/:method", post(sign_envelope))
        .route("/encrypt", post(encrypt));

    let mut app = mount(Router::new(), &mounts.safe, safe);
    if let Some(prefix) = &mounts.unsafe_ {
        let unsafe_routes = Router::new()
            .route("/submit/:method", post(submit))
            .route("/decrypt", post(decrypt));
        app = mount(app, prefix, unsafe_routes);
    }

    app.layer(TraceLayer::new_for_http())
        .with_state(AppState { client })
}

/// Turn a client error into a response without leaking internals.
fn failure(route: &str, e: &AlipayError) -> Response {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(route = route, status = status.as_u16(), error = %e, "Request failed");
    } else {
        warn!(route = route, status = status.as_u16(), error = %e, "Request rejected");
    }

    match e {
        AlipayError::Business(business) => (status, Json(business)).into_response(),
        _ => status.into_response(),
    }
}

/// An empty body is no payload; anything else must be JSON.
fn parse_payload(body: &Bytes) -> Result<Value, StatusCode> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Payload is not JSON");
        StatusCode::BAD_REQUEST
    })
}

/// POST /ack/:method - gateway notification
async fn ack(
    State(state): State<AppState>,
    Path(method): Path<String>,
    form: Result<Form<BTreeMap<String, String>>, FormRejection>,
) -> Response {
    let params = match form {
        Ok(Form(params)) => params,
        Err(e) => {
            warn!(method = %method, error = %e, "Malformed notification body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match state.client.dispatch_notification(&method, params).await {
        Ok(ack) => ack.as_str().into_response(),
        Err(e) => failure("ack", &e),
    }
}

/// POST /sign/:method - signed envelope without sending it
async fn sign_envelope(
    State(state): State<AppState>,
    Path(method): Path<String>,
    body: Bytes,
) -> Response {
    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(status) => return status.into_response(),
    };
    match state.client.build_envelope(&method, &payload) {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => failure("sign", &e),
    }
}

/// POST /encrypt - raw cipher passthrough
async fn encrypt(State(state): State<AppState>, body: String) -> Response {
    match state.client.encrypt(&body) {
        Ok(ciphertext) => ciphertext.into_response(),
        Err(e) => failure("encrypt", &e),
    }
}

/// POST /submit/:method - sign, send and unwrap a business call
async fn submit(
    State(state): State<AppState>,
    Path(method): Path<String>,
    body: Bytes,
) -> Response {
    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(status) => return status.into_response(),
    };
    match state.client.execute(&method, &payload).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => failure("submit", &e),
    }
}

/// POST /decrypt - raw cipher passthrough
async fn decrypt(State(state): State<AppState>, body: String) -> Response {
    match state.client.decrypt(body.trim()) {
        Ok(plaintext) => plaintext.into_response(),
        Err(e) => failure("decrypt", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/alipay"), "/alipay");
        assert_eq!(normalize_prefix("alipay/"), "/alipay");
        assert_eq!(normalize_prefix("/pay/alipay/"), "/pay/alipay");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn test_mounts_from_config() {
        let mut config = ServerConfig::default();
        let mounts = Mounts::from_config(&config).unwrap();
        assert_eq!(mounts, Mounts::default());

        config.unsafe_routes = true;
        let mounts = Mounts::from_config(&config).unwrap();
        assert_eq!(mounts.unsafe_.as_deref(), Some("/unsafe/alipay"));

        config.unsafe_mount = "alipay/".into();
        assert!(Mounts::from_config(&config).is_err());
    }

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(&Bytes::new()), Ok(Value::Null));
        assert_eq!(parse_payload(&Bytes::from_static(b" \n")), Ok(Value::Null));
        assert_eq!(
            parse_payload(&Bytes::from_static(br#"{"a":1}"#)).unwrap()["a"],
            1
        );
        assert_eq!(
            parse_payload(&Bytes::from_static(b"{oops")),
            Err(StatusCode::BAD_REQUEST)
        );
    }
}
