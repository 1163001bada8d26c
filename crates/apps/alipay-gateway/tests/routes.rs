//! Route tests, driven in-process with `tower::ServiceExt::oneshot`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alipay_client::{AlipayClient, MethodOptions, Notification};
use alipay_gateway::{router, Mounts};
use alipay_test_utils::{
    form_body, test_config, trade_success_notification, MockGateway, Reply,
};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const PRECREATE: &str = "alipay.trade.precreate";
const QUERY: &str = "alipay.trade.query";

struct Harness {
    app: Router,
    gateway: MockGateway,
    handled: Arc<AtomicUsize>,
}

fn harness(mounts: Mounts) -> Harness {
    let gateway = MockGateway::new().with_aes_key();
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = handled.clone();

    let client = AlipayClient::builder(test_config())
        .method(
            PRECREATE,
            MethodOptions::default().with_encrypt(true).with_notify(true),
        )
        .on_notify(PRECREATE, move |notification: Notification| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                anyhow::ensure!(
                    notification.get("out_trade_no") != Some("fail"),
                    "order store unavailable"
                );
                Ok(())
            }
        })
        .transport(Arc::new(gateway.clone()))
        .build()
        .unwrap();

    Harness {
        app: router(Arc::new(client), &mounts),
        gateway,
        handled,
    }
}

fn with_unsafe() -> Mounts {
    Mounts {
        unsafe_: Some("/unsafe/alipay".to_string()),
        ..Mounts::default()
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

fn form(uri: &str, body: String) -> Request<Body> {
    post(uri, "application/x-www-form-urlencoded; charset=utf-8", body)
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn ack_verified_notification_is_success() {
    let h = harness(Mounts::default());
    let body = form_body(&trade_success_notification("20150320010101001"));

    let (status, text) = send(&h.app, form("/alipay/ack/alipay.trade.precreate", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "success");
    assert_eq!(h.handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ack_handler_failure_is_error_body() {
    let h = harness(Mounts::default());
    let body = form_body(&trade_success_notification("fail"));

    let (status, text) = send(&h.app, form("/alipay/ack/alipay.trade.precreate", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "error");
    assert_eq!(h.handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ack_tampered_notification_is_bad_request() {
    let h = harness(Mounts::default());
    let mut params = trade_success_notification("20150320010101001");
    params.insert("total_amount".into(), "0.01".into());

    let (status, text) = send(
        &h.app,
        form("/alipay/ack/alipay.trade.precreate", form_body(&params)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.is_empty());
    assert_eq!(h.handled.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ack_without_form_body_is_bad_request() {
    let h = harness(Mounts::default());
    let (status, _) = send(
        &h.app,
        post("/alipay/ack/alipay.trade.precreate", "application/json", "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ack_for_unhandled_method_is_success() {
    let h = harness(Mounts::default());
    let body = form_body(&trade_success_notification("20150320010101001"));

    let (status, text) = send(&h.app, form("/alipay/ack/alipay.trade.wap.pay", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "success");
    assert_eq!(h.handled.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Sign / encrypt
// =============================================================================

#[tokio::test]
async fn sign_returns_envelope_without_sending() {
    let h = harness(Mounts::default());
    let (status, text) = send(
        &h.app,
        post(
            "/alipay/sign/alipay.trade.precreate",
            "application/json",
            r#"{"out_trade_no":"1","total_amount":"0.01","subject":"t"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let envelope: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(envelope["method"], PRECREATE);
    assert_eq!(envelope["encrypt_type"], "AES");
    assert_eq!(
        envelope["notify_url"],
        "https://x.test/ack/alipay.trade.precreate"
    );
    assert!(envelope["sign"].is_string());
    assert_eq!(h.gateway.request_count(), 0);
}

#[tokio::test]
async fn sign_rejects_malformed_json() {
    let h = harness(Mounts::default());
    let (status, text) = send(
        &h.app,
        post("/alipay/sign/alipay.trade.query", "application/json", "{oops"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.is_empty());
}

#[tokio::test]
async fn encrypt_then_decrypt_round_trips() {
    let h = harness(with_unsafe());
    let (status, ciphertext) = send(
        &h.app,
        post("/alipay/encrypt", "text/plain", r#"{"a":"b"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(ciphertext, r#"{"a":"b"}"#);

    let (status, plaintext) = send(
        &h.app,
        post("/unsafe/alipay/decrypt", "text/plain", ciphertext),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plaintext, r#"{"a":"b"}"#);
}

#[tokio::test]
async fn decrypt_garbage_is_bad_request() {
    let h = harness(with_unsafe());
    let (status, text) = send(
        &h.app,
        post("/unsafe/alipay/decrypt", "text/plain", "not-ciphertext"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.is_empty());
}

// =============================================================================
// Unsafe routes
// =============================================================================

#[tokio::test]
async fn unsafe_routes_absent_by_default() {
    let h = harness(Mounts::default());
    let (status, _) = send(
        &h.app,
        post("/unsafe/alipay/decrypt", "text/plain", "x"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &h.app,
        post("/alipay/decrypt", "text/plain", "x"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_returns_unwrapped_body() {
    let h = harness(with_unsafe());
    h.gateway.set_reply(
        PRECREATE,
        Reply::Body(json!({"code": "10000", "msg": "Success", "qr_code": "https://qr.test/1"})),
    );

    let (status, text) = send(
        &h.app,
        post(
            "/unsafe/alipay/submit/alipay.trade.precreate",
            "application/json",
            r#"{"out_trade_no":"1","total_amount":"0.01","subject":"t"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["qr_code"], "https://qr.test/1");

    let sent: Value = serde_json::from_str(&h.gateway.last_biz_content().unwrap()).unwrap();
    assert_eq!(sent["out_trade_no"], "1");
}

#[tokio::test]
async fn submit_business_error_is_unprocessable() {
    let h = harness(with_unsafe());
    h.gateway.set_reply(
        QUERY,
        Reply::Body(json!({
            "code": "40004",
            "msg": "Business Failed",
            "sub_code": "ACQ.TRADE_NOT_EXIST",
            "sub_msg": "trade does not exist"
        })),
    );

    let (status, text) = send(
        &h.app,
        post(
            "/unsafe/alipay/submit/alipay.trade.query",
            "application/json",
            r#"{"out_trade_no":"missing"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["code"], "40004");
    assert_eq!(body["sub_code"], "ACQ.TRADE_NOT_EXIST");
}

#[tokio::test]
async fn submit_transport_error_is_bad_gateway() {
    let h = harness(with_unsafe());
    h.gateway
        .set_reply(QUERY, Reply::TransportError("connection reset".into()));

    let (status, text) = send(
        &h.app,
        post("/unsafe/alipay/submit/alipay.trade.query", "application/json", "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(text.is_empty());
}

#[tokio::test]
async fn routes_mount_at_root() {
    let h = harness(Mounts {
        safe: "/".to_string(),
        unsafe_: None,
    });
    let body = form_body(&trade_success_notification("20150320010101001"));
    let (status, text) = send(&h.app, form("/ack/alipay.trade.precreate", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "success");
}
