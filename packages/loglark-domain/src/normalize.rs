use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde_json::{Map, Value};

use crate::{
	error::{Error, Result},
	estimate,
	record::{ExerciseRecord, ExpenseRecord, FoodRecord, Intensity, RecordKind, TimeRecord},
	repair,
};

/// Normalize raw tool-call JSON into a [`TimeRecord`]. Timestamps without
/// an offset are interpreted in `fallback_offset` (the request timezone).
pub fn normalize_time(raw: &str, fallback_offset: FixedOffset) -> Result<TimeRecord> {
	let kind = RecordKind::Time;
	let map = repair::parse_tool_json(raw, kind.known_fields())?;

	require(&map, kind.required_fields())?;

	let activity = take_string(&map, "activity")?
		.filter(|value| !value.trim().is_empty())
		.unwrap_or_else(|| "未命名活动".to_string());
	let start = take_datetime(&map, "start_iso", fallback_offset)?;
	let end = take_datetime(&map, "end_iso", fallback_offset)?;

	Ok(TimeRecord {
		activity,
		start,
		end,
		category: take_category(&map)?,
		tags: take_string_list(&map, "tags")?,
		mentions: take_string_list(&map, "mentions")?,
		confidence: take_number(&map, "confidence")?.unwrap_or(0.0),
		assumptions: take_string_list(&map, "assumptions")?,
	})
}

pub fn normalize_expense(raw: &str) -> Result<ExpenseRecord> {
	let kind = RecordKind::Expense;
	let map = repair::parse_tool_json(raw, kind.known_fields())?;

	require(&map, kind.required_fields())?;

	let content = take_string(&map, "content")?.unwrap_or_default();
	let amount = take_number(&map, "amount")?.unwrap_or(0.0);

	if amount < 0.0 || !amount.is_finite() {
		return Err(Error::InvalidField {
			field: "amount",
			message: format!("expected a non-negative amount, got {amount}"),
		});
	}

	let category = take_category(&map)?.ok_or(Error::InvalidField {
		field: "category",
		message: "expense category must be non-empty".to_string(),
	})?;
	let mut tags = take_string_list(&map, "tags")?;
	let mut assumptions = take_string_list(&map, "assumptions")?;

	if tags.is_empty() {
		assumptions.push(format!("标签为空，默认使用分类「{category}」"));
		tags.push(category.clone());
	}

	Ok(ExpenseRecord {
		content,
		amount,
		category,
		tags,
		confidence: take_number(&map, "confidence")?.unwrap_or(0.0),
		assumptions,
	})
}

pub fn normalize_food(raw: &str) -> Result<FoodRecord> {
	let kind = RecordKind::Food;
	let map = repair::parse_tool_json(raw, kind.known_fields())?;

	require(&map, kind.required_fields())?;

	let food = take_string(&map, "food")?.unwrap_or_default();
	let mut calories = non_negative(&map, "calories")?.unwrap_or(0.0);
	let category = take_category(&map)?;
	let mut tags = take_string_list(&map, "tags")?;
	let mut assumptions = take_string_list(&map, "assumptions")?;

	if tags.is_empty() {
		let tag = estimate::default_tag(&food, category.as_deref());

		assumptions.push(format!("标签为空，根据内容默认为「{tag}」"));
		tags.push(tag);
	}
	if calories <= estimate::ESTIMATE_TRIGGER {
		let estimated = match estimate::lookup_food_calories(&food) {
			Some((keyword, estimated)) => {
				assumptions
					.push(format!("热量缺失或过低（{calories}卡），按「{keyword}」估算为{estimated}卡"));

				estimated
			},
			None => {
				let estimated = estimate::DEFAULT_FOOD_CALORIES;

				assumptions.push(format!("热量缺失或过低（{calories}卡），使用默认估算{estimated}卡"));

				estimated
			},
		};

		calories = estimated;
	}

	Ok(FoodRecord {
		food,
		calories,
		protein: non_negative(&map, "protein")?.unwrap_or(0.0),
		carbs: non_negative(&map, "carbs")?.unwrap_or(0.0),
		fat: non_negative(&map, "fat")?.unwrap_or(0.0),
		category,
		tags,
		confidence: take_number(&map, "confidence")?.unwrap_or(0.0),
		assumptions,
	})
}

pub fn normalize_exercise(raw: &str) -> Result<ExerciseRecord> {
	let kind = RecordKind::Exercise;
	let map = repair::parse_tool_json(raw, kind.known_fields())?;

	require(&map, kind.required_fields())?;

	let exercise_type = take_string(&map, "exercise_type")?.unwrap_or_default();
	let duration_minutes = non_negative(&map, "duration_minutes")?.unwrap_or(0.0);
	let mut calories_burned = non_negative(&map, "calories_burned")?.unwrap_or(0.0);
	let intensity =
		Intensity::from_label(&take_string(&map, "intensity")?.unwrap_or_default());
	let category = take_category(&map)?;
	let mut tags = take_string_list(&map, "tags")?;
	let mut assumptions = take_string_list(&map, "assumptions")?;

	if tags.is_empty() {
		let tag = estimate::default_tag(&exercise_type, category.as_deref());

		assumptions.push(format!("标签为空，根据内容默认为「{tag}」"));
		tags.push(tag);
	}
	if calories_burned <= estimate::ESTIMATE_TRIGGER {
		let estimated =
			estimate::estimate_exercise_calories(intensity, duration_minutes, &exercise_type);

		assumptions.push(format!(
			"消耗热量缺失或过低（{calories_burned}卡），按{intensity}强度 {duration_minutes}分钟估算为{estimated}卡"
		));

		calories_burned = estimated;
	}

	Ok(ExerciseRecord {
		exercise_type,
		duration_minutes,
		calories_burned,
		intensity,
		category,
		tags,
		confidence: take_number(&map, "confidence")?.unwrap_or(0.0),
		assumptions,
	})
}

fn require(map: &Map<String, Value>, fields: &'static [&'static str]) -> Result<()> {
	for field in fields {
		if !map.contains_key(*field) {
			return Err(Error::MissingField { field });
		}
	}

	Ok(())
}

fn take_string(map: &Map<String, Value>, field: &'static str) -> Result<Option<String>> {
	match map.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(value)) => Ok(Some(value.clone())),
		Some(other) => Err(Error::InvalidField {
			field,
			message: format!("expected a string, got {other}"),
		}),
	}
}

/// Empty-string categories collapse to `None`; the LLM enum includes `""`
/// for "unsure".
fn take_category(map: &Map<String, Value>) -> Result<Option<String>> {
	Ok(take_string(map, "category")?.filter(|value| !value.trim().is_empty()))
}

fn take_number(map: &Map<String, Value>, field: &'static str) -> Result<Option<f64>> {
	match map.get(field) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(value)) => Ok(value.as_f64()),
		// Models occasionally quote numbers.
		Some(Value::String(value)) => match value.trim().parse::<f64>() {
			Ok(parsed) => Ok(Some(parsed)),
			Err(_) => Err(Error::InvalidField {
				field,
				message: format!("expected a number, got {value:?}"),
			}),
		},
		Some(other) => Err(Error::InvalidField {
			field,
			message: format!("expected a number, got {other}"),
		}),
	}
}

fn non_negative(map: &Map<String, Value>, field: &'static str) -> Result<Option<f64>> {
	let Some(value) = take_number(map, field)? else {
		return Ok(None);
	};

	if value < 0.0 || !value.is_finite() {
		return Err(Error::InvalidField {
			field,
			message: format!("expected a non-negative number, got {value}"),
		});
	}

	Ok(Some(value))
}

fn take_string_list(map: &Map<String, Value>, field: &'static str) -> Result<Vec<String>> {
	match map.get(field) {
		None | Some(Value::Null) => Ok(Vec::new()),
		Some(Value::Array(items)) => {
			let mut out = Vec::with_capacity(items.len());

			for item in items {
				match item {
					Value::String(value) if !value.trim().is_empty() => out.push(value.clone()),
					Value::String(_) => {},
					other =>
						return Err(Error::InvalidField {
							field,
							message: format!("expected a string array, found {other}"),
						}),
				}
			}

			Ok(out)
		},
		Some(other) => Err(Error::InvalidField {
			field,
			message: format!("expected an array, got {other}"),
		}),
	}
}

fn take_datetime(
	map: &Map<String, Value>,
	field: &'static str,
	fallback_offset: FixedOffset,
) -> Result<DateTime<FixedOffset>> {
	let raw = take_string(map, field)?.ok_or(Error::MissingField { field })?;

	if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
		return Ok(parsed);
	}

	// The model is prompted for offset-carrying ISO 8601 but sometimes
	// drops the offset; interpret naive timestamps in the request timezone.
	for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
		if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, format)
			&& let Some(resolved) = fallback_offset.from_local_datetime(&naive).single()
		{
			return Ok(resolved);
		}
	}

	Err(Error::InvalidField { field, message: format!("not an ISO 8601 timestamp: {raw:?}") })
}
