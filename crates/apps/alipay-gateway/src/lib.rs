//! Notification endpoint and signing gateway for the Alipay open API.
//!
//! This crate provides the `alipay-gateway` binary, which puts an
//! [`AlipayClient`](alipay_client::AlipayClient) behind HTTP:
//!
//! - **Notifications**: verifies gateway webhooks and answers `success` or
//!   `error`, optionally forwarding each one to the host application
//! - **Signing**: signs envelopes for browser redirects and app handoff
//! - **Debugging**: raw encrypt, and (behind an unsafe prefix) decrypt and
//!   submit
//!
//! # Quick Start
//!
//! ```bash
//! # Fingerprint a certificate
//! alipay-gateway cert-sn keys/appCertPublicKey.crt
//!
//! # Sign a call without sending it
//! alipay-gateway -c gateway.toml sign alipay.trade.query '{"out_trade_no":"1"}'
//!
//! # Serve notifications
//! alipay-gateway -c gateway.toml serve --listen 0.0.0.0:8080
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from `alipay-gateway.toml` in the working
//! directory. Override with `--config`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod forward;
pub mod routes;

pub use config::GatewayConfig;
pub use error::{AppError, AppResult};
pub use routes::{router, Mounts};
