//! Tool type definitions for function-calling.
//!
//! Provider-agnostic types for tool declarations, calls, and results. The
//! declarations come from a [`ToolBackend`](super::backend::ToolBackend) once
//! per session and are never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool declaration that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match a name the backend can invoke).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Names of the parameters the schema marks as required, in order.
    #[must_use]
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl From<rmcp::model::Tool> for ToolDefinition {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool
                .description
                .map(|d| d.to_string())
                .unwrap_or_default(),
            parameters: Value::Object((*tool.input_schema).clone()),
        }
    }
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

impl ToolCall {
    /// Parses the argument JSON into an object.
    ///
    /// An empty or whitespace-only argument string is an empty object; some
    /// providers send that for parameterless calls.
    ///
    /// # Errors
    ///
    /// Returns a message if the arguments are not valid JSON or not an object.
    pub fn parse_arguments(&self) -> Result<Map<String, Value>, String> {
        if self.arguments.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(format!(
                "invalid arguments: expected a JSON object, got {other}"
            )),
            Err(e) => Err(format!("invalid arguments: {e}")),
        }
    }
}

/// The result of executing a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Name of the tool that produced the result.
    pub tool_name: String,
    /// Result content (tool output on success, error message on failure).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: "extract_document".to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_parse_arguments_object() {
        let args = call(r#"{"document_id": "a.txt"}"#)
            .parse_arguments()
            .unwrap_or_default();
        assert_eq!(args.get("document_id"), Some(&json!("a.txt")));
    }

    #[test]
    fn test_parse_arguments_empty_is_empty_object() {
        assert_eq!(call("").parse_arguments(), Ok(Map::new()));
        assert_eq!(call("  ").parse_arguments(), Ok(Map::new()));
    }

    #[test]
    fn test_parse_arguments_rejects_non_object() {
        let err = call("[1, 2]").parse_arguments().unwrap_err();
        assert!(err.contains("expected a JSON object"));
        let err = call("{not json").parse_arguments().unwrap_err();
        assert!(err.starts_with("invalid arguments"));
    }

    #[test]
    fn test_required_parameters() {
        let def = ToolDefinition {
            name: "summarize_sections".to_string(),
            description: "Summarize".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "document_id": {"type": "string"},
                    "template_id": {"type": "string"}
                },
                "required": ["document_id", "template_id"]
            }),
        };
        assert_eq!(
            def.required_parameters(),
            vec!["document_id", "template_id"]
        );
    }

    #[test]
    fn test_tool_result_serialization() {
        let result = ToolResult {
            tool_call_id: "call_123".to_string(),
            tool_name: "identify_risks".to_string(),
            content: r#"{"risks":[]}"#.to_string(),
            is_error: false,
        };
        let json = serde_json::to_string(&result).unwrap_or_default();
        assert!(json.contains("call_123"));
        assert!(json.contains("identify_risks"));
    }
}
