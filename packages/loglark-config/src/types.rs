use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub notion: Notion,
	#[serde(default)]
	pub webhook: Webhook,
	#[serde(default)]
	pub categories: Categories,
	#[serde(default)]
	pub reports: Reports,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// IANA timezone applied when a request carries no `tz`.
	#[serde(default = "default_tz")]
	pub default_tz: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_llm_path")]
	pub path: String,
	pub model: String,
	#[serde(default = "default_temperature")]
	pub temperature: f32,
	#[serde(default = "default_llm_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Notion {
	#[serde(default = "default_notion_base")]
	pub api_base: String,
	pub token: String,
	#[serde(default = "default_notion_version")]
	pub version: String,
	#[serde(default = "default_notion_timeout_ms")]
	pub timeout_ms: u64,
	pub databases: NotionDatabases,
}

/// One Notion database per record kind.
#[derive(Debug, Deserialize)]
pub struct NotionDatabases {
	pub time: String,
	pub expense: String,
	pub food: String,
	pub exercise: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Webhook {
	/// Incoming webhook accepting `{msg_type, content.text}`. Reports are
	/// skipped (with a warning) when unset.
	pub url: Option<String>,
	#[serde(default = "default_webhook_timeout_ms")]
	pub timeout_ms: u64,
}

/// Candidate sets handed to the LLM as closed enums.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Categories {
	pub time: Vec<String>,
	pub expense: Vec<String>,
	pub food: CandidateSet,
	pub exercise: CandidateSet,
}
impl Default for Categories {
	fn default() -> Self {
		Self {
			time: to_strings(&["深度工作", "会议", "沟通", "家庭", "运动", "学习", "杂项"]),
			expense: to_strings(&["餐饮", "交通", "购物", "娱乐", "医疗", "教育", "住房", "其他"]),
			food: CandidateSet {
				categories: to_strings(&["早餐", "午餐", "晚餐", "零食", "加餐", "饮料"]),
				tags: to_strings(&["高蛋白", "健康", "零食", "主食"]),
			},
			exercise: CandidateSet {
				categories: to_strings(&[
					"有氧运动",
					"力量训练",
					"柔韧性训练",
					"高强度间歇训练",
					"户外运动",
					"其他",
				]),
				tags: to_strings(&["户外", "室内", "高强度", "低强度"]),
			},
		}
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateSet {
	pub categories: Vec<String>,
	pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Reports {
	/// Baseline calorie burn used in deficit calculations.
	pub bmr: f64,
	/// Timezone the cron expressions are evaluated in.
	pub timezone: String,
	pub daily_time_cron: String,
	pub monthly_expense_cron: String,
	pub daily_calorie_cron: String,
}
impl Default for Reports {
	fn default() -> Self {
		Self {
			bmr: 1_800.0,
			timezone: default_tz(),
			// Daily time report at 06:00 covering yesterday.
			daily_time_cron: "0 0 6 * * *".to_string(),
			// Monthly expense report on the 1st at 09:00.
			monthly_expense_cron: "0 0 9 1 * *".to_string(),
			// Calorie balance report at 21:30 covering today.
			daily_calorie_cron: "0 30 21 * * *".to_string(),
		}
	}
}

fn to_strings(items: &[&str]) -> Vec<String> {
	items.iter().map(ToString::to_string).collect()
}

fn default_tz() -> String {
	"Asia/Shanghai".to_string()
}

fn default_llm_path() -> String {
	"/chat/completions".to_string()
}

fn default_temperature() -> f32 {
	0.2
}

fn default_llm_timeout_ms() -> u64 {
	40_000
}

fn default_notion_base() -> String {
	"https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
	"2022-06-28".to_string()
}

fn default_notion_timeout_ms() -> u64 {
	20_000
}

fn default_webhook_timeout_ms() -> u64 {
	10_000
}
