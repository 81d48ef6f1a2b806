//! Service operations over the providers: intent classification, per-kind
//! ingestion, the unified router, and report generation. Provider access
//! goes through trait seams so tests can script the upstreams.

pub mod classify;
pub mod error;
pub mod ingest_exercise;
pub mod ingest_expense;
pub mod ingest_food;
pub mod ingest_time;
pub mod report;
pub mod unified;

use std::{future::Future, pin::Pin, sync::Arc};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

pub use error::{Error, Result};
pub use ingest_exercise::IngestExerciseResponse;
pub use ingest_expense::IngestExpenseResponse;
pub use ingest_food::IngestFoodResponse;
pub use ingest_time::IngestTimeResponse;
pub use report::RangeReportRequest;
pub use unified::{UnifiedIngestResponse, UnifiedResult};

use loglark_config::{Config, LlmProviderConfig, Notion, Webhook};
use loglark_providers::{llm, llm::ToolSpec, notion, notion::CreatedPage, webhook};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn forced_tool_call<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		system: &'a str,
		user: &'a str,
		tool: &'a ToolSpec,
	) -> BoxFuture<'a, loglark_providers::Result<String>>;
}

pub trait RecordStore
where
	Self: Send + Sync,
{
	fn create_page<'a>(
		&'a self,
		cfg: &'a Notion,
		database_id: &'a str,
		properties: Value,
	) -> BoxFuture<'a, loglark_providers::Result<CreatedPage>>;

	fn query_database<'a>(
		&'a self,
		cfg: &'a Notion,
		database_id: &'a str,
		filter: Value,
	) -> BoxFuture<'a, loglark_providers::Result<Vec<Value>>>;
}

pub trait Notifier
where
	Self: Send + Sync,
{
	fn send_text<'a>(
		&'a self,
		cfg: &'a Webhook,
		text: &'a str,
	) -> BoxFuture<'a, loglark_providers::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub llm: Arc<dyn LlmProvider>,
	pub store: Arc<dyn RecordStore>,
	pub notifier: Arc<dyn Notifier>,
}
impl Providers {
	pub fn new(
		llm: Arc<dyn LlmProvider>,
		store: Arc<dyn RecordStore>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		Self { llm, store, notifier }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { llm: provider.clone(), store: provider.clone(), notifier: provider }
	}
}

struct DefaultProviders;

impl LlmProvider for DefaultProviders {
	fn forced_tool_call<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		system: &'a str,
		user: &'a str,
		tool: &'a ToolSpec,
	) -> BoxFuture<'a, loglark_providers::Result<String>> {
		Box::pin(llm::forced_tool_call(cfg, system, user, tool))
	}
}

impl RecordStore for DefaultProviders {
	fn create_page<'a>(
		&'a self,
		cfg: &'a Notion,
		database_id: &'a str,
		properties: Value,
	) -> BoxFuture<'a, loglark_providers::Result<CreatedPage>> {
		Box::pin(notion::create_page(cfg, database_id, properties))
	}

	fn query_database<'a>(
		&'a self,
		cfg: &'a Notion,
		database_id: &'a str,
		filter: Value,
	) -> BoxFuture<'a, loglark_providers::Result<Vec<Value>>> {
		Box::pin(notion::query_database(cfg, database_id, filter))
	}
}

impl Notifier for DefaultProviders {
	fn send_text<'a>(
		&'a self,
		cfg: &'a Webhook,
		text: &'a str,
	) -> BoxFuture<'a, loglark_providers::Result<()>> {
		Box::pin(webhook::send_text(cfg, text))
	}
}

pub struct LoglarkService {
	pub cfg: Config,
	pub providers: Providers,
}
impl LoglarkService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}

/// Common body of every ingestion endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct IngestRequest {
	pub utterance: String,
	pub tz: Option<String>,
	pub source: Option<String>,
	/// Override for "current time", ISO 8601.
	pub now: Option<String>,
	/// Skip classification and force one intent on the unified endpoint.
	pub force_type: Option<String>,
}

pub(crate) struct RequestContext {
	pub(crate) tz: Tz,
	pub(crate) now: DateTime<Tz>,
	pub(crate) source: String,
}
impl RequestContext {
	pub(crate) fn fixed_offset(&self) -> FixedOffset {
		self.now.offset().fix()
	}
}

impl LoglarkService {
	pub(crate) fn resolve_context(&self, req: &IngestRequest) -> Result<RequestContext> {
		if req.utterance.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "utterance must be non-empty.".to_string() });
		}

		let tz_name = req.tz.as_deref().unwrap_or(&self.cfg.service.default_tz);
		let tz: Tz = tz_name
			.parse()
			.map_err(|_| Error::InvalidRequest { message: format!("Unknown timezone: {tz_name}") })?;
		let now = match &req.now {
			Some(raw) => DateTime::parse_from_rfc3339(raw)
				.map_err(|_| Error::InvalidRequest {
					message: format!("now must be an ISO 8601 timestamp, got {raw:?}"),
				})?
				.with_timezone(&tz),
			None => Utc::now().with_timezone(&tz),
		};

		Ok(RequestContext {
			tz,
			now,
			source: req.source.clone().unwrap_or_default(),
		})
	}
}

/// The Notes rich-text blob stored alongside every record. Keeps the raw
/// utterance and everything the normalizer synthesized.
pub(crate) fn notes_text(
	source: &str,
	mentions: &[String],
	raw: &str,
	assumptions: &[String],
	confidence: f64,
) -> String {
	format!(
		"source={source}; mentions={}; raw={raw}; assumptions={}; confidence={confidence}",
		mentions.join(","),
		assumptions.join("; "),
	)
}

/// Notion caps title/rich-text content at 2000 characters per block.
pub(crate) fn clip(text: &str, max_chars: usize) -> String {
	text.chars().take(max_chars).collect()
}

pub(crate) fn title_property(text: &str) -> Value {
	serde_json::json!({ "title": [{ "text": { "content": clip(text, 2_000) } }] })
}

pub(crate) fn rich_text_property(text: &str) -> Value {
	serde_json::json!({ "rich_text": [{ "text": { "content": clip(text, 2_000) } }] })
}

pub(crate) fn select_property(name: &str) -> Value {
	serde_json::json!({ "select": { "name": name } })
}

/// Notion rejects more than 50 multi-select options on one property.
pub(crate) fn multi_select_property(tags: &[String]) -> Value {
	let options: Vec<Value> =
		tags.iter().take(50).map(|tag| serde_json::json!({ "name": tag })).collect();

	serde_json::json!({ "multi_select": options })
}
