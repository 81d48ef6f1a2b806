use serde::Serialize;
use serde_json::Value;

use loglark_domain::{ExpenseRecord, normalize};
use loglark_providers::llm::ToolSpec;

use crate::{IngestRequest, LoglarkService, Result};

#[derive(Clone, Debug, Serialize)]
pub struct IngestExpenseResponse {
	pub parsed: ExpenseRecord,
	pub notion_page_id: String,
	pub notion_url: Option<String>,
}

fn extract_expense_tool(categories: &[String]) -> ToolSpec {
	ToolSpec {
		name: "extract_expense_log",
		description: "从中文口语的一句话里抽取花销记录字段。".to_string(),
		parameters: serde_json::json!({
			"type": "object",
			"properties": {
				"content": { "type": "string", "description": "花销内容，如\"午餐\"、\"打车\"" },
				"amount": { "type": "number", "description": "金额（元），非负数" },
				"category": { "type": "string", "description": "花销分类，从候选集中选择", "enum": categories },
				"tags": { "type": "array", "items": { "type": "string" }, "description": "从 #标签 中提取，无则空数组" },
				"confidence": { "type": "number", "description": "0-1 置信度", "minimum": 0, "maximum": 1 },
				"assumptions": { "type": "array", "items": { "type": "string" }, "description": "解析过程中的假设/补全" }
			},
			"required": ["content", "amount", "category", "tags", "confidence", "assumptions"],
			"additionalProperties": false
		}),
	}
}

fn system_prompt(now: &str, tz: &str) -> String {
	format!(
		r#"
你是一个"花销记录解析器"。任务：把用户的一句中文口语解析为结构化的花销字段，并**仅**通过 function calling 输出，不要自然语言回答。

规则：
1) 识别金额，支持"50元、15.5元、30块钱"等表达，统一为数字（元）；
2) content 保留花销内容的名词短语，如"午餐"、"打车"；
3) 必须从候选集中选择一个分类；
4) 从文本中抽取 #标签 到 tags；
5) 任何推断或默认值写入 assumptions；
6) 仅通过工具 extract_expense_log 返回，不要普通文本。

当前时间: {now}
当前时区: {tz}
"#
	)
}

fn expense_properties(record: &ExpenseRecord, date_iso: &str, notes: &str) -> Value {
	let mut properties = serde_json::json!({
		"Content": crate::title_property(&record.content),
		"Amount": { "number": record.amount },
		"Date": { "date": { "start": date_iso } },
		"Category": crate::select_property(&record.category),
		"Tags": crate::multi_select_property(&record.tags),
	});

	if !notes.is_empty() {
		properties["Notes"] = crate::rich_text_property(notes);
	}

	properties
}

impl LoglarkService {
	pub async fn ingest_expense(&self, req: IngestRequest) -> Result<IngestExpenseResponse> {
		let ctx = self.resolve_context(&req)?;
		let tool = extract_expense_tool(&self.cfg.categories.expense);
		let system = system_prompt(&ctx.now.to_rfc3339(), &ctx.tz.to_string());
		let user = format!("原始口述：{}\n请抽取并返回函数参数。", req.utterance);
		let raw =
			self.providers.llm.forced_tool_call(&self.cfg.providers.llm, &system, &user, &tool).await?;
		let record = normalize::normalize_expense(&raw)?;
		let notes =
			crate::notes_text(&ctx.source, &[], &req.utterance, &record.assumptions, record.confidence);
		let created = self
			.providers
			.store
			.create_page(
				&self.cfg.notion,
				&self.cfg.notion.databases.expense,
				expense_properties(&record, &ctx.now.to_rfc3339(), &notes),
			)
			.await?;

		tracing::info!("Created expense entry {} for {} yuan.", created.id, record.amount);

		Ok(IngestExpenseResponse {
			parsed: record,
			notion_page_id: created.id,
			notion_url: created.url,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn properties_carry_amount_and_date() {
		let record = ExpenseRecord {
			content: "午餐".to_string(),
			amount: 50.0,
			category: "餐饮".to_string(),
			tags: vec!["餐饮".to_string()],
			confidence: 0.9,
			assumptions: Vec::new(),
		};
		let properties = expense_properties(&record, "2025-10-03T12:30:00+08:00", "");

		assert_eq!(properties["Content"]["title"][0]["text"]["content"], "午餐");
		assert_eq!(properties["Amount"]["number"], 50.0);
		assert_eq!(properties["Date"]["date"]["start"], "2025-10-03T12:30:00+08:00");
		assert_eq!(properties["Category"]["select"]["name"], "餐饮");
	}

	#[test]
	fn expense_category_enum_is_closed() {
		let tool = extract_expense_tool(&["餐饮".to_string(), "交通".to_string()]);
		let category_enum = tool.parameters["properties"]["category"]["enum"]
			.as_array()
			.expect("missing enum")
			.clone();

		assert_eq!(category_enum.len(), 2);
	}
}
