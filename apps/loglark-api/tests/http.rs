use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};

use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use loglark_api::{routes, state::AppState};
use loglark_config::{
	Categories, Config, LlmProviderConfig, Notion, NotionDatabases, Providers as ProviderSettings,
	Reports, Service, Webhook,
};
use loglark_providers::{llm::ToolSpec, notion::CreatedPage};
use loglark_service::{BoxFuture, LlmProvider, LoglarkService, Notifier, Providers, RecordStore};

const TIME_ARGS: &str = r#"{
	"start_iso": "2025-10-03T09:00:00+08:00",
	"end_iso": "2025-10-03T10:00:00+08:00",
	"activity": "写代码",
	"tags": ["工作"],
	"mentions": [],
	"category": "深度工作",
	"confidence": 0.95,
	"assumptions": []
}"#;

struct ScriptedLlm {
	responses: Mutex<VecDeque<String>>,
}
impl ScriptedLlm {
	fn new(responses: &[&str]) -> Arc<Self> {
		Arc::new(Self { responses: Mutex::new(responses.iter().map(ToString::to_string).collect()) })
	}
}
impl LlmProvider for ScriptedLlm {
	fn forced_tool_call<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_system: &'a str,
		_user: &'a str,
		_tool: &'a ToolSpec,
	) -> BoxFuture<'a, loglark_providers::Result<String>> {
		let next = self.responses.lock().expect("lock poisoned").pop_front();

		Box::pin(async move {
			next.ok_or(loglark_providers::Error::InvalidResponse {
				message: "Script exhausted.".to_string(),
			})
		})
	}
}

#[derive(Default)]
struct CapturingStore {
	created: Mutex<Vec<(String, Value)>>,
	query_batches: Mutex<VecDeque<Vec<Value>>>,
}
impl CapturingStore {
	fn with_batches(batches: Vec<Vec<Value>>) -> Arc<Self> {
		Arc::new(Self {
			created: Mutex::new(Vec::new()),
			query_batches: Mutex::new(batches.into_iter().collect()),
		})
	}
}
impl RecordStore for CapturingStore {
	fn create_page<'a>(
		&'a self,
		_cfg: &'a Notion,
		database_id: &'a str,
		properties: Value,
	) -> BoxFuture<'a, loglark_providers::Result<CreatedPage>> {
		let mut created = self.created.lock().expect("lock poisoned");

		created.push((database_id.to_string(), properties));

		let id = format!("page-{}", created.len());

		Box::pin(async move { Ok(CreatedPage { url: Some(format!("https://www.notion.so/{id}")), id }) })
	}

	fn query_database<'a>(
		&'a self,
		_cfg: &'a Notion,
		_database_id: &'a str,
		_filter: Value,
	) -> BoxFuture<'a, loglark_providers::Result<Vec<Value>>> {
		let batch = self.query_batches.lock().expect("lock poisoned").pop_front().unwrap_or_default();

		Box::pin(async move { Ok(batch) })
	}
}

#[derive(Default)]
struct CapturingNotifier {
	sent: Mutex<Vec<String>>,
}
impl Notifier for CapturingNotifier {
	fn send_text<'a>(
		&'a self,
		_cfg: &'a Webhook,
		text: &'a str,
	) -> BoxFuture<'a, loglark_providers::Result<()>> {
		self.sent.lock().expect("lock poisoned").push(text.to_string());

		Box::pin(async move { Ok(()) })
	}
}

fn test_config(webhook_url: Option<&str>) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			default_tz: "Asia/Shanghai".to_string(),
		},
		providers: ProviderSettings {
			llm: LlmProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "deepseek-chat".to_string(),
				temperature: 0.2,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
		},
		notion: Notion {
			api_base: "http://localhost".to_string(),
			token: "test-token".to_string(),
			version: "2022-06-28".to_string(),
			timeout_ms: 1_000,
			databases: NotionDatabases {
				time: "db-time".to_string(),
				expense: "db-expense".to_string(),
				food: "db-food".to_string(),
				exercise: "db-exercise".to_string(),
			},
		},
		webhook: Webhook { url: webhook_url.map(ToString::to_string), timeout_ms: 1_000 },
		categories: Categories::default(),
		reports: Reports::default(),
	}
}

fn test_state(
	llm: Arc<ScriptedLlm>,
	store: Arc<CapturingStore>,
	notifier: Arc<CapturingNotifier>,
	webhook_url: Option<&str>,
) -> AppState {
	let service = Arc::new(LoglarkService::with_providers(
		test_config(webhook_url),
		Providers::new(llm, store, notifier),
	));

	AppState::with_service(service).expect("Failed to initialize app state.")
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

fn post_empty(uri: &str) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.body(Body::empty())
		.expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let state = test_state(
		ScriptedLlm::new(&[]),
		CapturingStore::with_batches(Vec::new()),
		Arc::new(CapturingNotifier::default()),
		None,
	);
	let app = routes::router(state);
	let response = app
		.oneshot(
			Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn forced_time_ingest_creates_a_page() {
	let store = CapturingStore::with_batches(Vec::new());
	let state = test_state(
		ScriptedLlm::new(&[TIME_ARGS]),
		store.clone(),
		Arc::new(CapturingNotifier::default()),
		None,
	);
	let app = routes::router(state);
	let payload = serde_json::json!({
		"utterance": "9点到10点写代码 #工作",
		"force_type": "time",
		"now": "2025-10-03T12:00:00+08:00"
	});
	let response = app
		.oneshot(post_json("/unified-ingest", payload))
		.await
		.expect("Failed to call unified-ingest.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["intent"], "time");
	assert_eq!(json["classification"], Value::Null);
	assert_eq!(json["result"]["notion_page_id"], "page-1");
	assert_eq!(json["result"]["parsed"]["activity"], "写代码");

	let created = store.created.lock().expect("lock poisoned");

	assert_eq!(created.len(), 1);
	assert_eq!(created[0].0, "db-time");
}

#[tokio::test]
async fn classifier_garbage_maps_to_bad_gateway() {
	let state = test_state(
		ScriptedLlm::new(&["抱歉，我无法分类这条指令。"]),
		CapturingStore::with_batches(Vec::new()),
		Arc::new(CapturingNotifier::default()),
		None,
	);
	let app = routes::router(state);
	let payload = serde_json::json!({ "utterance": "随便说点什么" });
	let response = app
		.oneshot(post_json("/unified-ingest", payload))
		.await
		.expect("Failed to call unified-ingest.");

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "classification_failed");
}

#[tokio::test]
async fn unsupported_forced_intent_maps_to_bad_request() {
	let state = test_state(
		ScriptedLlm::new(&[]),
		CapturingStore::with_batches(Vec::new()),
		Arc::new(CapturingNotifier::default()),
		None,
	);
	let app = routes::router(state);
	let payload = serde_json::json!({ "utterance": "睡了8小时", "force_type": "sleep" });
	let response = app
		.oneshot(post_json("/unified-ingest", payload))
		.await
		.expect("Failed to call unified-ingest.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "unsupported_intent");
}

#[tokio::test]
async fn manual_daily_report_returns_the_rendered_text() {
	let notifier = Arc::new(CapturingNotifier::default());
	let state = test_state(
		ScriptedLlm::new(&[]),
		CapturingStore::with_batches(vec![Vec::new()]),
		notifier.clone(),
		None,
	);
	let app = routes::router(state);
	let response = app
		.oneshot(post_empty("/stats/run-manual"))
		.await
		.expect("Failed to call /stats/run-manual.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;
	let report = json["report"].as_str().expect("missing report");

	assert!(report.contains("昨天没有记录任何时间数据"));
	// No webhook configured, so the text is returned but not delivered.
	assert!(notifier.sent.lock().expect("lock poisoned").is_empty());
}

#[tokio::test]
async fn manual_report_with_a_date_range_runs_the_range_stats() {
	let time_page = serde_json::json!({
		"properties": {
			"Activity": { "title": [{ "text": { "content": "写代码" } }] },
			"When": {
				"date": { "start": "2024-10-02T09:00:00+08:00", "end": "2024-10-02T11:00:00+08:00" }
			},
			"Category": { "select": { "name": "深度工作" } },
			"Tags": { "multi_select": [{ "name": "工作" }] }
		}
	});
	let state = test_state(
		ScriptedLlm::new(&[]),
		CapturingStore::with_batches(vec![vec![time_page]]),
		Arc::new(CapturingNotifier::default()),
		None,
	);
	let app = routes::router(state);
	let payload = serde_json::json!({ "start_date": "2024-10-01", "end_date": "2024-10-07" });
	let response = app
		.oneshot(post_json("/stats/run-manual", payload))
		.await
		.expect("Failed to call /stats/run-manual.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;
	let report = json["report"].as_str().expect("missing report");

	assert!(report.contains("2024-10-01 到 2024-10-07 时间统计报告"));
	assert!(report.contains("统计天数: 7 天"));
}

#[tokio::test]
async fn slash_separated_range_dates_map_to_bad_request() {
	let state = test_state(
		ScriptedLlm::new(&[]),
		CapturingStore::with_batches(Vec::new()),
		Arc::new(CapturingNotifier::default()),
		None,
	);
	let app = routes::router(state);
	let payload = serde_json::json!({ "start_date": "2024/10/01", "end_date": "2024-10-07" });
	let response = app
		.oneshot(post_json("/stats/run-manual", payload))
		.await
		.expect("Failed to call /stats/run-manual.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn scheduler_endpoints_toggle_the_running_flag() {
	let state = test_state(
		ScriptedLlm::new(&[]),
		CapturingStore::with_batches(Vec::new()),
		Arc::new(CapturingNotifier::default()),
		None,
	);
	let app = routes::router(state.clone());
	let started = app
		.clone()
		.oneshot(post_empty("/stats/start"))
		.await
		.expect("Failed to call /stats/start.");

	assert_eq!(started.status(), StatusCode::OK);
	assert_eq!(json_body(started).await["running"], true);
	assert!(state.scheduler.is_running());

	let stopped =
		app.oneshot(post_empty("/stats/stop")).await.expect("Failed to call /stats/stop.");

	assert_eq!(stopped.status(), StatusCode::OK);
	assert_eq!(json_body(stopped).await["running"], false);
	assert!(!state.scheduler.is_running());
}
