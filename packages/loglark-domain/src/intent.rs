use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of record kinds an utterance can resolve to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
	Time,
	Expense,
	Food,
	Exercise,
}
impl Intent {
	pub const ALL: [Intent; 4] = [Intent::Time, Intent::Expense, Intent::Food, Intent::Exercise];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Time => "time",
			Self::Expense => "expense",
			Self::Food => "food",
			Self::Exercise => "exercise",
		}
	}
}
impl fmt::Display for Intent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Intent {
	type Err = UnknownIntent;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"time" => Ok(Self::Time),
			"expense" => Ok(Self::Expense),
			"food" => Ok(Self::Food),
			"exercise" => Ok(Self::Exercise),
			other => Err(UnknownIntent { intent: other.to_string() }),
		}
	}
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown intent type: {intent}")]
pub struct UnknownIntent {
	pub intent: String,
}

/// Result of the LLM intent classifier. Produced once per utterance and
/// never mutated.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IntentClassification {
	pub intent_type: Intent,
	pub confidence: f64,
	pub reasoning: String,
	#[serde(default)]
	pub extracted_info: Value,
}
