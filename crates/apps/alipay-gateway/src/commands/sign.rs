//! Offline signing command.

use serde_json::Value;

use crate::cli::SignOutput;
use crate::commands::build_client;
use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};

/// Execute the sign command.
pub fn sign(
    config: &GatewayConfig,
    method: &str,
    payload: Option<&str>,
    output: SignOutput,
) -> AppResult<String> {
    let payload: Value = match payload {
        Some(text) => serde_json::from_str(text)
            .map_err(|e| AppError::user(format!("Payload is not valid JSON: {}", e)))?,
        None => Value::Null,
    };
    let client = build_client(config)?;

    let rendered = match output {
        SignOutput::Envelope => {
            serde_json::to_string_pretty(&client.build_envelope(method, &payload)?)?
        }
        SignOutput::Query => client.sdk_execute(method, &payload)?,
        SignOutput::Url => client.page_url(method, &payload)?.to_string(),
    };
    Ok(rendered)
}
