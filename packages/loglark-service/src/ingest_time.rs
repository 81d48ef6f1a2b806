use serde::Serialize;
use serde_json::Value;

use loglark_domain::{TimeRecord, normalize};
use loglark_providers::llm::ToolSpec;

use crate::{IngestRequest, LoglarkService, Result};

#[derive(Clone, Debug, Serialize)]
pub struct IngestTimeResponse {
	pub parsed: TimeRecord,
	pub notion_page_id: String,
	pub notion_url: Option<String>,
}

fn extract_time_tool(categories: &[String]) -> ToolSpec {
	let mut category_enum: Vec<String> = categories.to_vec();

	// The model may answer "unsure" with an empty string.
	category_enum.push(String::new());

	ToolSpec {
		name: "extract_time_log",
		description:
			"从中文口语的一句话里抽取时间记录字段，并把相对时间解析成绝对时间（ISO 8601，含时区）。"
				.to_string(),
		parameters: serde_json::json!({
			"type": "object",
			"properties": {
				"start_iso": { "type": "string", "description": "起始时间，ISO-8601（含时区），例：2025-10-03T09:00:00+08:00" },
				"end_iso": { "type": "string", "description": "结束时间，ISO-8601（含时区），例：2025-10-03T10:00:00+08:00" },
				"activity": { "type": "string", "description": "活动内容，保留动词短语即可" },
				"tags": { "type": "array", "items": { "type": "string" }, "description": "从 #标签 中提取，无则空数组" },
				"mentions": { "type": "array", "items": { "type": "string" }, "description": "从 @提及 中提取，无则空数组" },
				"category": { "type": "string", "description": "归类名，如不确定可为空字符串或从候选集中选择", "enum": category_enum },
				"confidence": { "type": "number", "description": "0-1 置信度", "minimum": 0, "maximum": 1 },
				"assumptions": { "type": "array", "items": { "type": "string" }, "description": "解析过程中的假设/补全" }
			},
			"required": ["start_iso", "end_iso", "activity", "tags", "mentions", "category", "confidence", "assumptions"],
			"additionalProperties": false
		}),
	}
}

fn system_prompt(now: &str, tz: &str) -> String {
	format!(
		r#"
你是一个"时间记录解析器"。任务：把用户的一句中文口语解析为结构化字段，并**仅**通过 function calling 输出，不要自然语言回答。

规则：
1) 解析中文时间短语，支持"9点到10点、10点半到现在、昨天晚上、上午/下午/晚上、刚才、昨晚23:10-0:40"等；
2) 只给一个时间点时，另一端按"当前时间"补齐；
3) 若出现跨日或顺序颠倒，确保 start_iso <= end_iso；
4) 必须输出 **ISO-8601 含时区**，时区以"当前时区"为准；
5) 若无明确活动文案，activity 用"未命名活动"；
6) 从文本中抽取 #标签 到 tags，@提及 到 mentions；
7) 尽量归到给定的类别集合；
8) 任何推断或默认值写入 assumptions；
9) 仅通过工具 extract_time_log 返回，不要普通文本。

当前时间: {now}
当前时区: {tz}
"#
	)
}

fn time_properties(record: &TimeRecord, notes: &str) -> Value {
	let mut properties = serde_json::json!({
		"Activity": crate::title_property(&record.activity),
		"When": { "date": { "start": record.start.to_rfc3339(), "end": record.end.to_rfc3339() } },
	});

	if let Some(category) = &record.category {
		properties["Category"] = crate::select_property(category);
	}
	if !record.tags.is_empty() {
		properties["Tags"] = crate::multi_select_property(&record.tags);
	}
	if !notes.is_empty() {
		properties["Notes"] = crate::rich_text_property(notes);
	}

	properties
}

impl LoglarkService {
	pub async fn ingest_time(&self, req: IngestRequest) -> Result<IngestTimeResponse> {
		let ctx = self.resolve_context(&req)?;
		let tool = extract_time_tool(&self.cfg.categories.time);
		let system = system_prompt(&ctx.now.to_rfc3339(), &ctx.tz.to_string());
		let user = format!("原始口述：{}\n请抽取并返回函数参数。", req.utterance);
		let raw =
			self.providers.llm.forced_tool_call(&self.cfg.providers.llm, &system, &user, &tool).await?;
		let record = normalize::normalize_time(&raw, ctx.fixed_offset())?;
		let notes = crate::notes_text(
			&ctx.source,
			&record.mentions,
			&req.utterance,
			&record.assumptions,
			record.confidence,
		);
		let created = self
			.providers
			.store
			.create_page(
				&self.cfg.notion,
				&self.cfg.notion.databases.time,
				time_properties(&record, &notes),
			)
			.await?;

		tracing::info!("Created time entry {} for {:?}.", created.id, record.activity);

		Ok(IngestTimeResponse { parsed: record, notion_page_id: created.id, notion_url: created.url })
	}
}

#[cfg(test)]
mod tests {
	use chrono::{DateTime, FixedOffset};

	use super::*;

	fn record() -> TimeRecord {
		TimeRecord {
			activity: "写代码".to_string(),
			start: DateTime::<FixedOffset>::parse_from_rfc3339("2025-10-03T09:00:00+08:00")
				.expect("bad literal"),
			end: DateTime::<FixedOffset>::parse_from_rfc3339("2025-10-03T10:00:00+08:00")
				.expect("bad literal"),
			category: Some("深度工作".to_string()),
			tags: vec!["工作".to_string()],
			mentions: vec!["项目A".to_string()],
			confidence: 0.95,
			assumptions: Vec::new(),
		}
	}

	#[test]
	fn properties_carry_all_fields() {
		let properties = time_properties(&record(), "source=; raw=...");

		assert_eq!(
			properties["Activity"]["title"][0]["text"]["content"],
			"写代码"
		);
		assert_eq!(properties["When"]["date"]["start"], "2025-10-03T09:00:00+08:00");
		assert_eq!(properties["Category"]["select"]["name"], "深度工作");
		assert_eq!(properties["Tags"]["multi_select"][0]["name"], "工作");
		assert!(properties["Notes"]["rich_text"][0]["text"]["content"]
			.as_str()
			.is_some());
	}

	#[test]
	fn optional_properties_are_omitted() {
		let mut bare = record();

		bare.category = None;
		bare.tags.clear();

		let properties = time_properties(&bare, "");

		assert!(properties.get("Category").is_none());
		assert!(properties.get("Tags").is_none());
		assert!(properties.get("Notes").is_none());
	}

	#[test]
	fn category_enum_includes_the_empty_string() {
		let tool = extract_time_tool(&["深度工作".to_string()]);
		let category_enum = tool.parameters["properties"]["category"]["enum"]
			.as_array()
			.expect("missing enum")
			.clone();

		assert_eq!(category_enum.len(), 2);
		assert_eq!(category_enum[1], "");
	}
}
