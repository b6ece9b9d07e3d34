//! JSON validator tool
//!
//! Syntactic check only: the text must parse as JSON. No schema checks.

use crate::core::{ToolCall, ToolResult};

/// Tool name exposed to the chart model
pub const JSON_VALIDATOR_TOOL: &str = "json_validator";

/// Outcome of a validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// Parser message, including line and column
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// Text returned to the model as the tool result
    pub fn to_tool_output(&self) -> String {
        match self {
            Validation::Valid => "Valid JSON".to_string(),
            Validation::Invalid(reason) => format!("Invalid JSON: {}", reason),
        }
    }
}

/// Checks whether a string is well-formed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValidator;

impl JsonValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate candidate text
    pub fn validate(&self, text: &str) -> Validation {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(_) => Validation::Valid,
            Err(e) => Validation::Invalid(e.to_string()),
        }
    }

    /// Execute as a tool call; the draft is passed in the `string` argument
    pub fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let Some(candidate) = tool_call.get_string("string") else {
            return ToolResult::failure(
                JSON_VALIDATOR_TOOL,
                "Invalid JSON: missing 'string' argument",
            );
        };

        let verdict = self.validate(&candidate);
        tracing::debug!(valid = verdict.is_valid(), "json_validator checked draft");

        match verdict {
            Validation::Valid => ToolResult::success(JSON_VALIDATOR_TOOL, verdict.to_tool_output()),
            Validation::Invalid(_) => {
                ToolResult::failure(JSON_VALIDATOR_TOOL, verdict.to_tool_output())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_document() {
        let v = JsonValidator::new();
        assert_eq!(v.validate(r#"{"chartsArray": [], "otherResearchFindings": ""}"#), Validation::Valid);
    }

    #[test]
    fn test_trailing_comma_is_invalid() {
        let v = JsonValidator::new();
        let verdict = v.validate(r#"{"chartsArray": [1, 2,]}"#);
        assert!(!verdict.is_valid());
        assert!(verdict.to_tool_output().starts_with("Invalid JSON: "));
    }

    #[test]
    fn test_revalidation_is_stable() {
        let v = JsonValidator::new();
        let text = r#"{"a": [1, {"b": null}]}"#;
        assert_eq!(v.validate(text), v.validate(text));
        assert!(v.validate(text).is_valid());
    }

    #[test]
    fn test_prose_is_invalid() {
        let v = JsonValidator::new();
        assert!(!v.validate("~QUESTION_TO_RESEARCHER~ need more data").is_valid());
    }

    #[test]
    fn test_execute_reports_verdict() {
        let v = JsonValidator::new();
        let call = ToolCall::new("c1", JSON_VALIDATOR_TOOL, serde_json::json!({"string": "[1,2]"}));
        let result = v.execute(&call);
        assert!(result.success);
        assert_eq!(result.output, "Valid JSON");

        let missing = ToolCall::new("c2", JSON_VALIDATOR_TOOL, serde_json::json!({}));
        assert!(!v.execute(&missing).success);
    }
}
