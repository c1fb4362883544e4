//! Tool executor that dispatches model tool calls to a [`ToolBackend`].
//!
//! Every call ends in exactly one [`ToolResult`] unless the backend's
//! connection fails: bad arguments, unknown tools, and tool-reported
//! failures become `"Error: ..."` result text the model can react to.
//! Transport failures propagate and end the session.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::backend::ToolBackend;
use super::tool::{ToolCall, ToolDefinition, ToolResult};
use crate::error::AgentError;

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 20_000_000;

/// Dispatches tool calls against the declared tool set.
pub struct ToolExecutor<'a> {
    backend: &'a dyn ToolBackend,
    declared: HashSet<String>,
}

impl<'a> ToolExecutor<'a> {
    /// Creates an executor for `tools` backed by `backend`.
    #[must_use]
    pub fn new(backend: &'a dyn ToolBackend, tools: &[ToolDefinition]) -> Self {
        Self {
            backend,
            declared: tools.iter().map(|t| t.name.clone()).collect(),
        }
    }

    /// Executes one call.
    ///
    /// # Errors
    ///
    /// Returns the backend's error only when it is not recoverable (for
    /// example [`AgentError::Transport`]).
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, AgentError> {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return Ok(error_result(
                call,
                &format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                ),
            ));
        }

        if !self.declared.contains(&call.name) {
            let err = AgentError::ToolNotFound {
                name: call.name.clone(),
            };
            warn!(tool = call.name, "model requested an undeclared tool");
            return Ok(error_result(call, &err.to_string()));
        }

        let arguments = match call.parse_arguments() {
            Ok(arguments) => arguments,
            Err(message) => return Ok(error_result(call, &message)),
        };

        match self.backend.invoke(&call.name, arguments).await {
            Ok(content) => {
                debug!(
                    tool = call.name,
                    call_id = call.id,
                    bytes = content.len(),
                    "tool execution complete"
                );
                Ok(ToolResult {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    content,
                    is_error: false,
                })
            }
            Err(e) if e.is_recoverable() => {
                debug!(tool = call.name, call_id = call.id, error = %e, "tool execution failed");
                Ok(error_result(call, &e.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

fn error_result(call: &ToolCall, message: &str) -> ToolResult {
    ToolResult {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        content: format!("Error: {message}"),
        is_error: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use std::sync::Mutex;

    /// Backend that records invocations and fails on request.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    #[async_trait]
    impl ToolBackend for RecordingBackend {
        async fn declare(&self) -> Result<Vec<ToolDefinition>, AgentError> {
            Ok(Vec::new())
        }

        async fn invoke(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> Result<String, AgentError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments));
            match name {
                "broken" => Err(AgentError::ToolExecution {
                    name: name.to_string(),
                    message: "disk on fire".to_string(),
                }),
                "offline" => Err(AgentError::Transport {
                    message: "connection reset".to_string(),
                }),
                _ => Ok(format!("{name} ok")),
            }
        }

        async fn read(&self, _uri: &str) -> Result<String, AgentError> {
            Ok(String::new())
        }
    }

    fn defs(names: &[&str]) -> Vec<ToolDefinition> {
        names
            .iter()
            .map(|n| ToolDefinition {
                name: (*n).to_string(),
                description: String::new(),
                parameters: json!({"type": "object"}),
            })
            .collect()
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: format!("call_{name}"),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_passes_parsed_arguments() {
        let backend = RecordingBackend::default();
        let tools = defs(&["extract_document"]);
        let executor = ToolExecutor::new(&backend, &tools);

        let result = executor
            .execute(&call("extract_document", r#"{"document_id": "a.txt"}"#))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content, "extract_document ok");
        assert_eq!(result.tool_call_id, "call_extract_document");

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0].1.get("document_id"), Some(&json!("a.txt")));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let backend = RecordingBackend::default();
        let tools = defs(&["extract_document"]);
        let executor = ToolExecutor::new(&backend, &tools);

        let result = executor.execute(&call("format_disk", "{}")).await.unwrap();
        assert!(result.is_error);
        assert_eq!(result.content, "Error: unknown tool 'format_disk'");
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_is_error_result() {
        let backend = RecordingBackend::default();
        let tools = defs(&["extract_document"]);
        let executor = ToolExecutor::new(&backend, &tools);

        let result = executor
            .execute(&call("extract_document", "{oops"))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.content.starts_with("Error: invalid arguments"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let backend = RecordingBackend::default();
        let tools = defs(&["broken"]);
        let executor = ToolExecutor::new(&backend, &tools);

        let result = executor.execute(&call("broken", "{}")).await.unwrap();
        assert!(result.is_error);
        assert!(result.content.contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let backend = RecordingBackend::default();
        let tools = defs(&["offline"]);
        let executor = ToolExecutor::new(&backend, &tools);

        let err = executor.execute(&call("offline", "{}")).await.unwrap_err();
        assert!(matches!(err, AgentError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_oversized_arguments_rejected() {
        let backend = RecordingBackend::default();
        let tools = defs(&["upload_document"]);
        let executor = ToolExecutor::new(&backend, &tools);

        let huge = "x".repeat(MAX_TOOL_ARGS_LEN + 1);
        let result = executor
            .execute(&call("upload_document", &huge))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.content.contains("too large"));
    }
}
