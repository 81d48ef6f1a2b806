use serde::Serialize;
use serde_json::Value;

use loglark_config::CandidateSet;
use loglark_domain::{FoodRecord, normalize};
use loglark_providers::llm::ToolSpec;

use crate::{IngestRequest, LoglarkService, Result};

#[derive(Clone, Debug, Serialize)]
pub struct IngestFoodResponse {
	pub parsed: FoodRecord,
	pub notion_page_id: String,
	pub notion_url: Option<String>,
}

fn extract_food_tool(candidates: &CandidateSet) -> ToolSpec {
	let mut category_enum: Vec<String> = candidates.categories.clone();

	category_enum.push(String::new());

	ToolSpec {
		name: "extract_food_log",
		description: "从中文口语的一句话里抽取饮食记录字段，估算热量与营养素。".to_string(),
		parameters: serde_json::json!({
			"type": "object",
			"properties": {
				"food": { "type": "string", "description": "食物名称，如\"鸡胸肉和蔬菜\"" },
				"calories": { "type": "number", "description": "热量（卡），未提及时为 0" },
				"protein": { "type": "number", "description": "蛋白质（克），未提及时为 0" },
				"carbs": { "type": "number", "description": "碳水化合物（克），未提及时为 0" },
				"fat": { "type": "number", "description": "脂肪（克），未提及时为 0" },
				"category": { "type": "string", "description": "餐次分类，如不确定可为空字符串", "enum": category_enum },
				"tags": { "type": "array", "items": { "type": "string" }, "description": format!("候选标签：{}；无合适标签则空数组", candidates.tags.join("、")) },
				"confidence": { "type": "number", "description": "0-1 置信度", "minimum": 0, "maximum": 1 },
				"assumptions": { "type": "array", "items": { "type": "string" }, "description": "解析过程中的假设/补全" }
			},
			"required": ["food", "calories", "category", "tags", "confidence", "assumptions"],
			"additionalProperties": false
		}),
	}
}

fn system_prompt(now: &str, tz: &str) -> String {
	format!(
		r#"
你是一个"饮食记录解析器"。任务：把用户的一句中文口语解析为结构化的饮食字段，并**仅**通过 function calling 输出，不要自然语言回答。

规则：
1) food 保留食物名称，如"鸡胸肉和蔬菜"、"一个苹果"；
2) 若用户说明了热量（如"约400卡"），写入 calories；未提及时填 0，由系统估算；
3) 蛋白质/碳水/脂肪同理，未提及时填 0；
4) 根据时间和语境归到餐次分类（早餐/午餐/晚餐/零食等），不确定可为空字符串；
5) 从文本中抽取 #标签 到 tags；
6) 任何推断或默认值写入 assumptions；
7) 仅通过工具 extract_food_log 返回，不要普通文本。

当前时间: {now}
当前时区: {tz}
"#
	)
}

fn food_properties(record: &FoodRecord, date_iso: &str, notes: &str) -> Value {
	let mut properties = serde_json::json!({
		"Food": crate::title_property(&record.food),
		"Calories": { "number": record.calories },
		"Protein": { "number": record.protein },
		"Carbs": { "number": record.carbs },
		"Fat": { "number": record.fat },
		"Date": { "date": { "start": date_iso } },
		"Tags": crate::multi_select_property(&record.tags),
	});

	if let Some(category) = &record.category {
		properties["Category"] = crate::select_property(category);
	}
	if !notes.is_empty() {
		properties["Notes"] = crate::rich_text_property(notes);
	}

	properties
}

impl LoglarkService {
	pub async fn ingest_food(&self, req: IngestRequest) -> Result<IngestFoodResponse> {
		let ctx = self.resolve_context(&req)?;
		let tool = extract_food_tool(&self.cfg.categories.food);
		let system = system_prompt(&ctx.now.to_rfc3339(), &ctx.tz.to_string());
		let user = format!("原始口述：{}\n请抽取并返回函数参数。", req.utterance);
		let raw =
			self.providers.llm.forced_tool_call(&self.cfg.providers.llm, &system, &user, &tool).await?;
		let record = normalize::normalize_food(&raw)?;
		let notes =
			crate::notes_text(&ctx.source, &[], &req.utterance, &record.assumptions, record.confidence);
		let created = self
			.providers
			.store
			.create_page(
				&self.cfg.notion,
				&self.cfg.notion.databases.food,
				food_properties(&record, &ctx.now.to_rfc3339(), &notes),
			)
			.await?;

		tracing::info!(
			"Created food entry {} for {:?} at {} calories.",
			created.id,
			record.food,
			record.calories,
		);

		Ok(IngestFoodResponse { parsed: record, notion_page_id: created.id, notion_url: created.url })
	}
}
