use serde_json::Value;

use loglark_domain::{Intent, IntentClassification, repair};
use loglark_providers::llm::ToolSpec;

use crate::{Error, LoglarkService, Result};

const FIELDS: &[&str] = &["intent_type", "confidence", "reasoning", "extracted_info"];

const SYSTEM_PROMPT: &str = r#"
你是一个"用户意图分类器"。任务：分析用户的中文指令，判断用户想要记录什么类型的数据。

分类规则：
1. time（时间记录）：包含时间范围、时间段、活动描述，如"9点到10点写代码"、"刚才开会30分钟"、"昨晚23:10-0:40看电影"
2. expense（花销记录）：包含金额、花费、购买，如"午餐花了50元"、"打车花了15.5元"、"买书30块钱"
3. food（饮食记录）：包含食物、餐饮、热量，如"午餐吃了鸡胸肉和蔬菜约400卡"、"吃了一个苹果约95卡"、"喝了杯咖啡"
4. exercise（运动记录）：包含运动、锻炼、健身，如"跑步30分钟消耗了300卡"、"做了45分钟的力量训练"、"游泳1小时"

注意：
1. 一条指令可能包含多个元素，选择最明显的主要意图
2. 如果指令模糊，根据上下文和常见模式判断
3. 必须从给定的四个类型中选择一个
4. 提供分类理由和置信度
5. 提取关键信息用于后续处理

仅通过工具 classify_user_intent 返回，不要自然语言回答。
"#;

fn classification_tool() -> ToolSpec {
	ToolSpec {
		name: "classify_user_intent",
		description: "对用户的中文指令进行分类，判断用户想要记录什么类型的数据。".to_string(),
		parameters: serde_json::json!({
			"type": "object",
			"properties": {
				"intent_type": {
					"type": "string",
					"description": "意图类型，必须是以下之一：time（时间记录）、expense（花销记录）、food（饮食记录）、exercise（运动记录）",
					"enum": ["time", "expense", "food", "exercise"]
				},
				"confidence": {
					"type": "number",
					"description": "分类置信度，0-1之间",
					"minimum": 0,
					"maximum": 1
				},
				"reasoning": {
					"type": "string",
					"description": "分类的理由和依据"
				},
				"extracted_info": {
					"type": "object",
					"description": "从指令中提取的关键信息，用于后续处理",
					"properties": {
						"has_time_range": { "type": "boolean" },
						"has_amount": { "type": "boolean" },
						"has_food": { "type": "boolean" },
						"has_exercise": { "type": "boolean" },
						"keywords": { "type": "array", "items": { "type": "string" } }
					}
				}
			},
			"required": ["intent_type", "confidence", "reasoning", "extracted_info"],
			"additionalProperties": false
		}),
	}
}

impl LoglarkService {
	/// Classify one utterance into the closed intent set with a single
	/// forced tool call. Anything short of a valid classification fails
	/// with [`Error::Classification`]; nothing is retried.
	pub async fn classify(&self, utterance: &str) -> Result<IntentClassification> {
		let tool = classification_tool();
		let user = format!("用户指令：{utterance}\n请分类并返回函数参数。");
		let raw = self
			.providers
			.llm
			.forced_tool_call(&self.cfg.providers.llm, SYSTEM_PROMPT, &user, &tool)
			.await
			.map_err(|err| Error::Classification { message: err.to_string() })?;
		let classification = parse_classification(&raw)?;

		tracing::info!(
			"Classified utterance as {} with confidence {}.",
			classification.intent_type,
			classification.confidence,
		);

		Ok(classification)
	}
}

fn parse_classification(raw: &str) -> Result<IntentClassification> {
	let map = repair::parse_tool_json(raw, FIELDS).map_err(|err| Error::Classification {
		message: err.to_string(),
	})?;

	for field in FIELDS {
		if !map.contains_key(*field) {
			return Err(Error::Classification {
				message: format!("Classification result is missing {field}."),
			});
		}
	}

	let intent = map["intent_type"].as_str().unwrap_or_default().to_string();

	if intent.parse::<Intent>().is_err() {
		return Err(Error::Classification { message: format!("Invalid intent type: {intent}") });
	}

	serde_json::from_value(Value::Object(map)).map_err(|err| Error::Classification {
		message: format!("Classification result does not match the schema: {err}"),
	})
}
