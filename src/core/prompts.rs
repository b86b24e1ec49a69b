//! Prompt construction for the three analysis operations.
//!
//! The language label is passed through as a free-form string; the code
//! payload is interpolated as data for a text-completion API and is not
//! escaped or validated.

/// Prompt for a beginner-level natural-language explanation.
pub fn explain_prompt(code: &str, language: &str) -> String {
    format!("Explain this {language} code in very simple terms for a beginner:\n\n{code}")
}

/// Prompt requesting the flowchart as a JSON array of step records.
pub fn flowchart_prompt(code: &str, language: &str) -> String {
    format!(
        "Analyze this {language} code and create a clean logical flowchart in JSON format.\n\
         Return ONLY a JSON array, where each element has:\n\
         {{id, label, type (start|end|input|output|process|decision), next: [ids of next steps]}}.\n\
         Ensure at least one \"start\" and one \"end\" are present.\n\
         Do NOT include any text outside JSON.\n\n\
         Code:\n{code}"
    )
}

/// Prompt requesting the call stack as a JSON array of function names.
pub fn call_stack_prompt(code: &str, language: &str) -> String {
    format!(
        "Analyze this {language} code and return ONLY a JSON array of the function or method names\n\
         in the order they would be executed (call stack).\n\
         Do NOT include any text outside JSON.\n\n\
         Code:\n{code}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_prompt_interpolates_both_fields() {
        let prompt = explain_prompt("fn main() {}", "Rust");
        assert!(prompt.contains("Rust code"));
        assert!(prompt.contains("fn main() {}"));
    }

    #[test]
    fn test_flowchart_prompt_requests_json_only() {
        let prompt = flowchart_prompt("x = 1", "Python");
        assert!(prompt.contains("ONLY a JSON array"));
        assert!(prompt.contains("start|end|input|output|process|decision"));
        assert!(prompt.contains("x = 1"));
    }

    #[test]
    fn test_call_stack_prompt_asks_for_execution_order() {
        let prompt = call_stack_prompt("void main() {}", "C");
        assert!(prompt.contains("call stack"));
        assert!(prompt.contains("void main() {}"));
    }
}
