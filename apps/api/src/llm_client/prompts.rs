// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every system prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "Return only valid JSON. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences.";

/// Fairness instruction shared by every prompt that ranks people.
pub const FAIRNESS_INSTRUCTION: &str = "\
    Be thorough, fair, and objective. Consider diversity and authentic representation. \
    Never penalise a performer for attributes the role does not require.";

/// Placeholder printed in prompts for an absent value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Joins a list for prompt display, falling back to `N/A` when empty.
pub fn join_or_na(items: Option<&[String]>) -> String {
    match items {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Renders an optional value for prompt display, falling back to `N/A`.
pub fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_or_na() {
        let langs = vec!["English".to_string(), "Spanish".to_string()];
        assert_eq!(join_or_na(Some(&langs)), "English, Spanish");
        assert_eq!(join_or_na(Some(&[])), "N/A");
        assert_eq!(join_or_na(None), "N/A");
    }

    #[test]
    fn test_or_na() {
        assert_eq!(or_na(Some(180)), "180");
        assert_eq!(or_na::<&str>(None), "N/A");
    }
}
