//! Serve command.

use std::sync::Arc;

use alipay_client::AlipayClient;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::error::AppResult;
use crate::forward::ForwardHandler;
use crate::routes::{router, Mounts};

/// Build the client described by the configuration.
///
/// When `[forward]` names a URL, a [`ForwardHandler`] is registered for
/// every forwarded method.
pub fn build_client(config: &GatewayConfig) -> AppResult<AlipayClient> {
    let client_config = config.client_config()?;
    let methods = config.forward.forwarded_methods(&client_config);

    let mut builder = AlipayClient::builder(client_config);
    if let Some(handler) = ForwardHandler::from_config(&config.forward)? {
        for method in &methods {
            info!(method = %method, url = %handler.url(), "Forwarding notifications");
            builder = builder.on_notify(method, handler.clone());
        }
    }
    Ok(builder.build()?)
}

/// Execute the serve command.
pub async fn serve(
    mut config: GatewayConfig,
    listen: Option<String>,
    unsafe_routes: bool,
) -> AppResult<String> {
    if let Some(listen) = listen {
        config.server.listen = listen;
    }
    if unsafe_routes {
        config.server.unsafe_routes = true;
    }

    let client = Arc::new(build_client(&config)?);
    let mounts = Mounts::from_config(&config.server)?;

    if config.forward.url.is_none() {
        warn!("No forward URL configured; notifications are acknowledged without processing");
    }
    if let Some(prefix) = &mounts.unsafe_ {
        warn!(prefix = %prefix, "Submit and decrypt routes are mounted; keep them off public networks");
    }

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    info!(
        listen = %config.server.listen,
        mount = %mounts.safe,
        app_id = %client.config().app_id,
        "Gateway listening"
    );

    axum::serve(listener, router(client, &mounts))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok("Gateway stopped.".to_string())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForwardConfig;
    use alipay_client::MethodOptions;
    use alipay_test_utils::test_config;

    #[test]
    fn test_build_client_registers_forwarding() {
        let mut config = GatewayConfig::default();
        config.alipay.client = test_config();
        config.alipay.client.methods.insert(
            "alipay.trade.precreate".into(),
            MethodOptions::default().with_notify(true),
        );
        config.forward = ForwardConfig {
            url: Some("http://127.0.0.1:3000/notify".into()),
            ..Default::default()
        };

        let client = build_client(&config).unwrap();
        assert!(client
            .method_options("alipay.trade.precreate")
            .on_notify
            .is_some());
        assert!(client.method_options("alipay.trade.query").on_notify.is_none());
    }

    #[test]
    fn test_build_client_without_forwarding() {
        let mut config = GatewayConfig::default();
        config.alipay.client = test_config();
        let client = build_client(&config).unwrap();
        assert!(client
            .method_options("alipay.trade.precreate")
            .on_notify
            .is_none());
    }
}
