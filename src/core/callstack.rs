//! Call-stack listing derived from model output.
//!
//! The model-reported order is the single source of truth; nothing here
//! verifies that the names exist in the code or that the order matches an
//! actual execution. "Call stack" means "ordered name listing", not a
//! debugger trace.

use serde_json::Value;

use super::parser::parse_json_array;

/// Coerce parsed array elements into display names.
///
/// JSON strings pass through; anything else is rendered compactly so a
/// model that emits numbers or objects still yields a visible entry.
pub fn stack_from_raw(raw: &str) -> Vec<String> {
    parse_json_array(raw)
        .into_iter()
        .map(|value| match value {
            Value::String(name) => name,
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_pass_through_in_order() {
        let raw = r#"["main", "init", "run"]"#;
        assert_eq!(stack_from_raw(raw), vec!["main", "init", "run"]);
    }

    #[test]
    fn test_prose_around_array_is_ignored() {
        let raw = "Sure! Here is the call stack: [\"main\", \"helper\"] hope that helps.";
        assert_eq!(stack_from_raw(raw), vec!["main", "helper"]);
    }

    #[test]
    fn test_non_string_entries_render_compactly() {
        assert_eq!(stack_from_raw("[1,2,3]"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_no_array_yields_empty_stack() {
        assert!(stack_from_raw("I could not determine the call order.").is_empty());
    }
}
