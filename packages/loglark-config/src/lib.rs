mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CandidateSet, Categories, Config, LlmProviderConfig, Notion, NotionDatabases, Providers,
	Reports, Service, Webhook,
};

use std::{fs, path::Path, str::FromStr};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.providers.llm.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.llm.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.llm.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&cfg.providers.llm.temperature) {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.notion.token.trim().is_empty() {
		return Err(Error::Validation { message: "notion.token must be non-empty.".to_string() });
	}

	for (label, id) in [
		("time", &cfg.notion.databases.time),
		("expense", &cfg.notion.databases.expense),
		("food", &cfg.notion.databases.food),
		("exercise", &cfg.notion.databases.exercise),
	] {
		if id.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("notion.databases.{label} must be non-empty."),
			});
		}
	}

	validate_timezone("service.default_tz", &cfg.service.default_tz)?;
	validate_timezone("reports.timezone", &cfg.reports.timezone)?;

	if !cfg.reports.bmr.is_finite() || cfg.reports.bmr <= 0.0 {
		return Err(Error::Validation {
			message: "reports.bmr must be a positive finite number.".to_string(),
		});
	}

	for (label, expr) in [
		("reports.daily_time_cron", &cfg.reports.daily_time_cron),
		("reports.monthly_expense_cron", &cfg.reports.monthly_expense_cron),
		("reports.daily_calorie_cron", &cfg.reports.daily_calorie_cron),
	] {
		if cron::Schedule::from_str(expr).is_err() {
			return Err(Error::Validation {
				message: format!("{label} is not a valid cron expression: {expr}"),
			});
		}
	}

	Ok(())
}

fn validate_timezone(label: &str, tz: &str) -> Result<()> {
	if chrono_tz::Tz::from_str(tz).is_err() {
		return Err(Error::Validation {
			message: format!("{label} is not a known IANA timezone: {tz}"),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.webhook.url.as_deref().map(|url| url.trim().is_empty()).unwrap_or(false) {
		cfg.webhook.url = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn minimal_toml() -> String {
		r#"
[service]
http_bind = "127.0.0.1:8000"
log_level = "info"

[providers.llm]
api_base = "https://api.deepseek.com/beta"
api_key  = "test-key"
model    = "deepseek-chat"

[notion]
token = "secret"

[notion.databases]
time     = "db-time"
expense  = "db-expense"
food     = "db-food"
exercise = "db-exercise"
"#
		.to_string()
	}

	#[test]
	fn minimal_config_passes_validation() {
		let cfg: Config = toml::from_str(&minimal_toml()).expect("parse failed");

		validate(&cfg).expect("validation failed");
		assert_eq!(cfg.service.default_tz, "Asia/Shanghai");
		assert_eq!(cfg.reports.bmr, 1_800.0);
		assert_eq!(cfg.categories.time.len(), 7);
		assert_eq!(cfg.categories.expense.len(), 8);
	}

	#[test]
	fn rejects_empty_api_key() {
		let raw = minimal_toml().replace("api_key  = \"test-key\"", "api_key  = \"\"");
		let cfg: Config = toml::from_str(&raw).expect("parse failed");

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn rejects_unknown_timezone() {
		let mut cfg: Config = toml::from_str(&minimal_toml()).expect("parse failed");

		cfg.service.default_tz = "Mars/Olympus".to_string();

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn rejects_bad_cron_expression() {
		let mut cfg: Config = toml::from_str(&minimal_toml()).expect("parse failed");

		cfg.reports.daily_time_cron = "not a cron".to_string();

		assert!(validate(&cfg).is_err());
	}

	#[test]
	fn blank_webhook_url_normalizes_to_none() {
		let raw = format!("{}\n[webhook]\nurl = \"  \"\n", minimal_toml());
		let mut cfg: Config = toml::from_str(&raw).expect("parse failed");

		normalize(&mut cfg);

		assert!(cfg.webhook.url.is_none());
	}
}
