use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{Error, Result};

const MAX_TOKENS: u32 = 400;

/// One function tool handed to the model together with a `tool_choice`
/// forcing it.
#[derive(Clone, Debug)]
pub struct ToolSpec {
	pub name: &'static str,
	pub description: String,
	pub parameters: Value,
}

/// Single chat-completions call with exactly one tool the model must call.
/// Returns the raw `arguments` string of that call, unparsed.
pub async fn forced_tool_call(
	cfg: &loglark_config::LlmProviderConfig,
	system: &str,
	user: &str,
	tool: &ToolSpec,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"messages": [
			{ "role": "system", "content": system },
			{ "role": "user", "content": user },
		],
		"tools": [{
			"type": "function",
			"function": {
				"name": tool.name,
				"description": tool.description,
				"parameters": tool.parameters,
			},
		}],
		"tool_choice": { "type": "function", "function": { "name": tool.name } },
		"temperature": cfg.temperature,
		"max_tokens": MAX_TOKENS,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Api {
			status: status.as_u16(),
			body: res.text().await.unwrap_or_default(),
		});
	}

	let json: Value = res.json().await?;

	tool_call_arguments(&json)
}

fn tool_call_arguments(json: &Value) -> Result<String> {
	json["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"]
		.as_str()
		.map(ToString::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat completion contains no tool call.".to_string(),
		})
}
