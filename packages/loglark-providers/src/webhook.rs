use std::time::Duration;

use reqwest::Client;

use crate::error::{Error, Result};

/// Post a plain-text message in the Feishu incoming-webhook shape.
pub async fn send_text(cfg: &loglark_config::Webhook, text: &str) -> Result<()> {
	let Some(url) = cfg.url.as_deref() else {
		return Err(Error::InvalidConfig { message: "Webhook url is not configured.".to_string() });
	};
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let body = serde_json::json!({ "msg_type": "text", "content": { "text": text } });
	let res = client.post(url).json(&body).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Api {
			status: status.as_u16(),
			body: res.text().await.unwrap_or_default(),
		});
	}

	Ok(())
}
