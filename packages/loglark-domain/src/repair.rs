use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

const SNIPPET_CHARS: usize = 500;

/// Parse LLM tool-call arguments, repairing the one malformation the
/// upstream model is known to produce: a field name missing its closing
/// quote before the value separator, `"field: value`.
///
/// Strict parse first, then a targeted pass over the schema's known field
/// names, then one broader pass over any identifier-shaped field name. If
/// all three fail the text is surfaced, truncated, and nothing is guessed
/// further.
pub fn parse_tool_json(raw: &str, known_fields: &[&str]) -> Result<Map<String, Value>> {
	if let Some(map) = try_parse(raw) {
		return Ok(map);
	}

	let targeted = repair_known_fields(raw, known_fields);

	if let Some(map) = try_parse(&targeted) {
		return Ok(map);
	}

	let generic = repair_generic(&targeted);

	if let Some(map) = try_parse(&generic) {
		return Ok(map);
	}

	Err(Error::MalformedResponse { snippet: snippet(raw) })
}

fn try_parse(text: &str) -> Option<Map<String, Value>> {
	match serde_json::from_str::<Value>(text) {
		Ok(Value::Object(map)) => Some(map),
		_ => None,
	}
}

fn repair_known_fields(raw: &str, known_fields: &[&str]) -> String {
	let mut fixed = raw.to_string();

	for field in known_fields {
		// `"field: ` → `"field": `. Field names are fixed identifiers, no
		// escaping needed.
		let pattern = format!("\"({field}):\\s*");
		let Ok(re) = Regex::new(&pattern) else {
			continue;
		};

		fixed = re.replace_all(&fixed, "\"$1\": ").into_owned();
	}

	fixed
}

fn repair_generic(raw: &str) -> String {
	// Best effort: any identifier-shaped key missing its closing quote.
	// May touch string values containing a matching shape; acceptable for a
	// last-resort pass that otherwise fails outright.
	let Ok(re) = Regex::new("\"([A-Za-z_][A-Za-z0-9_]*):\\s*") else {
		return raw.to_string();
	};

	re.replace_all(raw, "\"$1\": ").into_owned()
}

fn snippet(raw: &str) -> String {
	if raw.chars().count() <= SNIPPET_CHARS {
		return raw.to_string();
	}

	raw.chars().take(SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	const FIELDS: &[&str] = &["intent_type", "confidence", "reasoning"];

	#[test]
	fn valid_json_passes_through() {
		let raw = r#"{"intent_type": "food", "confidence": 0.9}"#;
		let map = parse_tool_json(raw, FIELDS).expect("parse failed");

		assert_eq!(map["intent_type"], "food");
		assert_eq!(map["confidence"], 0.9);
	}

	#[test]
	fn repairs_missing_closing_quote_on_known_field() {
		let raw = r#"{"intent_type: "food", "confidence: 0.9}"#;
		let map = parse_tool_json(raw, FIELDS).expect("repair failed");

		assert_eq!(map["intent_type"], "food");
		assert_eq!(map["confidence"], 0.9);
	}

	#[test]
	fn generic_pass_repairs_unknown_field_names() {
		let raw = r#"{"extra_field: 3, "intent_type": "time"}"#;
		let map = parse_tool_json(raw, FIELDS).expect("repair failed");

		assert_eq!(map["extra_field"], 3);
	}

	#[test]
	fn unrecoverable_text_surfaces_snippet() {
		let raw = "not json at all {{{";
		let err = parse_tool_json(raw, FIELDS).unwrap_err();

		match err {
			Error::MalformedResponse { snippet } => assert_eq!(snippet, raw),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn snippet_truncates_to_500_chars() {
		let raw = "x".repeat(2_000);
		let err = parse_tool_json(&raw, FIELDS).unwrap_err();

		match err {
			Error::MalformedResponse { snippet } => assert_eq!(snippet.chars().count(), 500),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn non_object_json_is_malformed() {
		assert!(parse_tool_json("[1, 2, 3]", FIELDS).is_err());
	}

	#[test]
	fn multibyte_snippet_truncation_is_char_safe() {
		let raw = format!("{}{{", "深".repeat(600));
		let err = parse_tool_json(&raw, FIELDS).unwrap_err();

		match err {
			Error::MalformedResponse { snippet } => assert_eq!(snippet.chars().count(), 500),
			other => panic!("unexpected error: {other:?}"),
		}
	}
}
