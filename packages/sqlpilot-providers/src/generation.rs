use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Sends one chat-completion request and returns the reply text. Never retries.
pub async fn complete(
	cfg: &sqlpilot_config::LlmProviderConfig,
	prompt: &str,
	temperature: f32,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await
		.map_err(|err| crate::classify(&cfg.provider_id, cfg.timeout_ms, err))?;
	let json: Value = res
		.error_for_status()?
		.json()
		.await
		.map_err(|err| crate::classify(&cfg.provider_id, cfg.timeout_ms, err))?;
	let content = parse_completion_content(json)?;

	tracing::debug!(provider = %cfg.provider_id, chars = content.len(), "Completion received.");

	Ok(content)
}

fn parse_completion_content(json: Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})
}
