use std::time::Duration;

use reqwest::{Client, header::{AUTHORIZATION, HeaderMap, HeaderValue}};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct CreatedPage {
	pub id: String,
	pub url: Option<String>,
}

pub async fn create_page(
	cfg: &loglark_config::Notion,
	database_id: &str,
	properties: Value,
) -> Result<CreatedPage> {
	let client = client(cfg)?;
	let url = format!("{}/v1/pages", cfg.api_base);
	let body = serde_json::json!({
		"parent": { "database_id": database_id },
		"properties": properties,
	});
	let res = client.post(url).json(&body).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Api {
			status: status.as_u16(),
			body: res.text().await.unwrap_or_default(),
		});
	}

	created_page(&res.json().await?)
}

/// Query a database, following `next_cursor` until `has_more` goes false.
/// Returns every page object across all result batches.
pub async fn query_database(
	cfg: &loglark_config::Notion,
	database_id: &str,
	filter: Value,
) -> Result<Vec<Value>> {
	let client = client(cfg)?;
	let url = format!("{}/v1/databases/{database_id}/query", cfg.api_base);
	let mut pages = Vec::new();
	let mut cursor: Option<String> = None;

	loop {
		let mut body = serde_json::json!({ "filter": filter });

		if let Some(cursor) = &cursor {
			body["start_cursor"] = Value::String(cursor.clone());
		}

		let res = client.post(&url).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(Error::Api {
				status: status.as_u16(),
				body: res.text().await.unwrap_or_default(),
			});
		}

		let json: Value = res.json().await?;
		let (mut batch, next) = page_results(&json)?;

		pages.append(&mut batch);

		match next {
			Some(next) => cursor = Some(next),
			None => return Ok(pages),
		}
	}
}

fn client(cfg: &loglark_config::Notion) -> Result<Client> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {}", cfg.token).parse()?);
	headers.insert("Notion-Version", HeaderValue::from_str(&cfg.version)?);

	Ok(Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.default_headers(headers)
		.build()?)
}

fn created_page(json: &Value) -> Result<CreatedPage> {
	let id = json["id"].as_str().ok_or_else(|| Error::InvalidResponse {
		message: "Created page is missing an id.".to_string(),
	})?;

	Ok(CreatedPage { id: id.to_string(), url: json["url"].as_str().map(ToString::to_string) })
}

fn page_results(json: &Value) -> Result<(Vec<Value>, Option<String>)> {
	let results = json["results"]
		.as_array()
		.ok_or_else(|| Error::InvalidResponse {
			message: "Query response is missing a results array.".to_string(),
		})?
		.clone();
	let next = (json["has_more"].as_bool() == Some(true))
		.then(|| json["next_cursor"].as_str().map(ToString::to_string))
		.flatten();

	Ok((results, next))
}
