use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Schema selector for the normalizer. One Notion database per kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordKind {
	Time,
	Expense,
	Food,
	Exercise,
}
impl RecordKind {
	/// Every field name the LLM tool schema can emit for this kind. Drives
	/// the targeted repair pass.
	pub fn known_fields(&self) -> &'static [&'static str] {
		match self {
			Self::Time => &[
				"start_iso",
				"end_iso",
				"activity",
				"tags",
				"mentions",
				"category",
				"confidence",
				"assumptions",
			],
			Self::Expense => &["content", "amount", "category", "tags", "confidence", "assumptions"],
			Self::Food => &[
				"food",
				"calories",
				"protein",
				"carbs",
				"fat",
				"category",
				"tags",
				"confidence",
				"assumptions",
			],
			Self::Exercise => &[
				"exercise_type",
				"duration_minutes",
				"calories_burned",
				"intensity",
				"category",
				"tags",
				"confidence",
				"assumptions",
			],
		}
	}

	/// Fields that must be present after parsing. Everything else defaults.
	pub fn required_fields(&self) -> &'static [&'static str] {
		match self {
			Self::Time => &["start_iso", "end_iso", "activity"],
			Self::Expense => &["content", "amount", "category", "tags"],
			Self::Food => &["food", "calories", "category", "tags"],
			Self::Exercise =>
				&["exercise_type", "duration_minutes", "calories_burned", "intensity", "category", "tags"],
		}
	}
}

/// A time-log entry parsed from an utterance.
#[derive(Clone, Debug, Serialize)]
pub struct TimeRecord {
	pub activity: String,
	pub start: DateTime<FixedOffset>,
	pub end: DateTime<FixedOffset>,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub mentions: Vec<String>,
	pub confidence: f64,
	pub assumptions: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExpenseRecord {
	pub content: String,
	pub amount: f64,
	pub category: String,
	pub tags: Vec<String>,
	pub confidence: f64,
	pub assumptions: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FoodRecord {
	pub food: String,
	pub calories: f64,
	pub protein: f64,
	pub carbs: f64,
	pub fat: f64,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub confidence: f64,
	pub assumptions: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExerciseRecord {
	pub exercise_type: String,
	pub duration_minutes: f64,
	pub calories_burned: f64,
	pub intensity: Intensity,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub confidence: f64,
	pub assumptions: Vec<String>,
}

/// Exercise intensity. The LLM is prompted with the Chinese labels, so both
/// spellings parse; unknown labels fall back to medium, the estimator's
/// default base rate.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
	Low,
	Medium,
	High,
}
impl Intensity {
	pub fn from_label(label: &str) -> Self {
		match label.trim() {
			"低" | "low" => Self::Low,
			"高" | "high" => Self::High,
			_ => Self::Medium,
		}
	}

	/// Chinese label as stored in the Notion select property.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Low => "低",
			Self::Medium => "中",
			Self::High => "高",
		}
	}
}
impl fmt::Display for Intensity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}
