use serde::Serialize;
use serde_json::Value;

use loglark_config::CandidateSet;
use loglark_domain::{ExerciseRecord, normalize};
use loglark_providers::llm::ToolSpec;

use crate::{IngestRequest, LoglarkService, Result};

#[derive(Clone, Debug, Serialize)]
pub struct IngestExerciseResponse {
	pub parsed: ExerciseRecord,
	pub notion_page_id: String,
	pub notion_url: Option<String>,
}

fn extract_exercise_tool(candidates: &CandidateSet) -> ToolSpec {
	let mut category_enum: Vec<String> = candidates.categories.clone();

	category_enum.push(String::new());

	ToolSpec {
		name: "extract_exercise_log",
		description: "从中文口语的一句话里抽取运动记录字段，估算消耗热量。".to_string(),
		parameters: serde_json::json!({
			"type": "object",
			"properties": {
				"exercise_type": { "type": "string", "description": "运动类型，如\"跑步\"、\"力量训练\"" },
				"duration_minutes": { "type": "number", "description": "时长（分钟），非负数" },
				"calories_burned": { "type": "number", "description": "消耗热量（卡），未提及时为 0" },
				"intensity": { "type": "string", "description": "运动强度", "enum": ["低", "中", "高"] },
				"category": { "type": "string", "description": "运动分类，如不确定可为空字符串", "enum": category_enum },
				"tags": { "type": "array", "items": { "type": "string" }, "description": format!("候选标签：{}；无合适标签则空数组", candidates.tags.join("、")) },
				"confidence": { "type": "number", "description": "0-1 置信度", "minimum": 0, "maximum": 1 },
				"assumptions": { "type": "array", "items": { "type": "string" }, "description": "解析过程中的假设/补全" }
			},
			"required": ["exercise_type", "duration_minutes", "calories_burned", "intensity", "category", "tags", "confidence", "assumptions"],
			"additionalProperties": false
		}),
	}
}

fn system_prompt(now: &str, tz: &str) -> String {
	format!(
		r#"
你是一个"运动记录解析器"。任务：把用户的一句中文口语解析为结构化的运动字段，并**仅**通过 function calling 输出，不要自然语言回答。

规则：
1) exercise_type 保留运动名称，如"跑步"、"游泳"、"力量训练"；
2) 识别时长，支持"30分钟、1小时、45min"等，统一为分钟数；
3) 若用户说明了消耗热量（如"消耗了300卡"），写入 calories_burned；未提及时填 0，由系统估算；
4) 强度未提及时默认"中"；
5) 从文本中抽取 #标签 到 tags；
6) 任何推断或默认值写入 assumptions；
7) 仅通过工具 extract_exercise_log 返回，不要普通文本。

当前时间: {now}
当前时区: {tz}
"#
	)
}

fn exercise_properties(record: &ExerciseRecord, date_iso: &str, notes: &str) -> Value {
	let mut properties = serde_json::json!({
		"Exercise": crate::title_property(&record.exercise_type),
		"Duration": { "number": record.duration_minutes },
		"Calories Burned": { "number": record.calories_burned },
		"Intensity": crate::select_property(record.intensity.label()),
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
	pub async fn ingest_exercise(&self, req: IngestRequest) -> Result<IngestExerciseResponse> {
		let ctx = self.resolve_context(&req)?;
		let tool = extract_exercise_tool(&self.cfg.categories.exercise);
		let system = system_prompt(&ctx.now.to_rfc3339(), &ctx.tz.to_string());
		let user = format!("原始口述：{}\n请抽取并返回函数参数。", req.utterance);
		let raw =
			self.providers.llm.forced_tool_call(&self.cfg.providers.llm, &system, &user, &tool).await?;
		let record = normalize::normalize_exercise(&raw)?;
		let notes =
			crate::notes_text(&ctx.source, &[], &req.utterance, &record.assumptions, record.confidence);
		let created = self
			.providers
			.store
			.create_page(
				&self.cfg.notion,
				&self.cfg.notion.databases.exercise,
				exercise_properties(&record, &ctx.now.to_rfc3339(), &notes),
			)
			.await?;

		tracing::info!(
			"Created exercise entry {} for {:?} burning {} calories.",
			created.id,
			record.exercise_type,
			record.calories_burned,
		);

		Ok(IngestExerciseResponse {
			parsed: record,
			notion_page_id: created.id,
			notion_url: created.url,
		})
	}
}
