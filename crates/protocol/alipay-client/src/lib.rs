//! Client SDK for the Alipay open API.
//!
//! This crate turns `(method, payload)` calls into signed gateway requests
//! and authenticates the gateway's notifications:
//!
//! - **Configuration**: [`AlipayConfig`] and per-method [`MethodOptions`]
//! - **Requests**: [`AlipayClient::build_envelope`] signs (and optionally
//!   encrypts) a call; [`AlipayClient::execute`] sends it through a
//!   [`Transport`] and unwraps the `*_response` body
//! - **Notifications**: [`AlipayClient::dispatch_notification`] verifies a
//!   posted form, decrypts it, and runs the method's [`NotificationHandler`]
//!
//! # Example
//!
//! ```no_run
//! # async fn example(pem: &str) -> alipay_client::AlipayResult<()> {
//! use alipay_client::{AlipayClient, AlipayConfig};
//! use serde_json::json;
//!
//! let client = AlipayClient::new(AlipayConfig::sandbox("2021000000000000", pem))?;
//! let trade = client
//!     .execute("alipay.trade.query", &json!({"out_trade_no": "20150320010101001"}))
//!     .await?;
//! println!("status: {}", trade["trade_status"]);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod notify;
mod options;
mod transport;

pub use client::{AlipayClient, AlipayClientBuilder};
pub use config::{
    AlipayConfig, CHINA_STANDARD_OFFSET_SECS, DEFAULT_CHARSET, DEFAULT_FORMAT,
    DEFAULT_TIMEOUT_SECS, DEFAULT_VERSION, PRODUCTION_GATEWAY, SANDBOX_GATEWAY,
};
pub use error::{AlipayError, AlipayResult};
pub use notify::{Ack, Notification};
pub use options::{MethodOptions, NotificationHandler};
pub use transport::{HttpTransport, Transport};

// Types callers need alongside the client
pub use alipay_crypto::{SignType, ENCRYPT_TYPE_AES};
pub use alipay_wire::{BusinessError, RequestEnvelope};
