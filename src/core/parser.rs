//! Extraction of JSON arrays from free-form model output.
//!
//! Even when a prompt demands "ONLY a JSON array", the model may prepend
//! prose, trail off with commentary, or emit invalid JSON. The policy here
//! is degrade-to-empty: any text that does not yield a parseable array
//! produces an empty sequence rather than an error, so one bad completion
//! never fails the request.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

/// First `[` through last `]`, across newlines.
fn array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"))
}

/// Locate the first bracket-delimited span in `raw`.
///
/// Greedy to the last `]`, so text containing several arrays yields one
/// span covering them all; callers get whatever JSON that span holds.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    array_pattern().find(raw).map(|m| m.as_str())
}

/// Parse the first bracketed span of `raw` as a JSON array.
///
/// Returns an empty vector when no span exists, the span is not valid
/// JSON, or it parses to something other than an array. Never errors.
pub fn parse_json_array(raw: &str) -> Vec<Value> {
    let Some(span) = extract_json_array(raw) else {
        warn!("model output contained no bracketed array, returning empty result");
        return Vec::new();
    };

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            warn!(
                "bracketed span parsed to {} instead of an array, returning empty result",
                type_name(&other)
            );
            Vec::new()
        }
        Err(e) => {
            warn!("bracketed span is not valid JSON ({e}), returning empty result");
            Vec::new()
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_brackets_yields_empty() {
        assert!(parse_json_array("the model refused to answer").is_empty());
        assert!(parse_json_array("").is_empty());
    }

    #[test]
    fn test_array_with_surrounding_prose() {
        let raw = "Sure! Here is the answer: [1,2,3] done.";
        assert_eq!(parse_json_array(raw), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_well_formed_array_unchanged() {
        let raw = r#"[{"id":1,"label":"Start","type":"start","next":[2]},{"id":2,"label":"End","type":"end","next":[]}]"#;
        let parsed = parse_json_array(raw);
        let expected: Vec<Value> =
            serde_json::from_str(raw).expect("test fixture is valid JSON");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_invalid_json_inside_brackets_yields_empty() {
        assert!(parse_json_array("[{not json at all]").is_empty());
    }

    #[test]
    fn test_unbalanced_brackets_yield_empty() {
        assert!(parse_json_array("here is [1, 2, 3 and nothing else").is_empty());
    }

    #[test]
    fn test_multiple_arrays_span_first_to_last_bracket() {
        // Greedy match covers both arrays; the span is not valid JSON,
        // so the degrade-to-empty policy kicks in.
        assert!(parse_json_array("[1,2] then [3,4]").is_empty());
    }

    #[test]
    fn test_nested_arrays_parse() {
        assert_eq!(
            parse_json_array("answer: [[1],[2]]"),
            vec![json!([1]), json!([2])]
        );
    }

    #[test]
    fn test_extract_spans_newlines() {
        let raw = "prefix\n[\n  \"a\",\n  \"b\"\n]\nsuffix";
        assert_eq!(extract_json_array(raw), Some("[\n  \"a\",\n  \"b\"\n]"));
    }
}
