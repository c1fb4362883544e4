//! Remote tool backend over MCP streamable HTTP.
//!
//! Connects with the `rmcp` client to an MCP server (normally `idp-mcp serve
//! http`) and maps protocol failures onto the session's error classes: an
//! MCP error reply or a result flagged `is_error` is a recoverable tool
//! failure, anything that breaks the connection is a transport failure.

use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ReadResourceRequestParams, ResourceContents,
};
use rmcp::service::RunningService;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{RoleClient, ServiceError, ServiceExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::backend::ToolBackend;
use super::tool::ToolDefinition;
use crate::error::AgentError;

/// Text used when a tool returns no text content.
pub const NO_CONTENT: &str = "No content returned.";

/// A live MCP client session.
pub struct McpBackend {
    service: RunningService<RoleClient, ()>,
    url: String,
    request_timeout: Duration,
}

impl McpBackend {
    /// Connects and completes the MCP handshake.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transport`] if the server is unreachable or the
    /// handshake fails within `request_timeout`.
    pub async fn connect(url: &str, request_timeout: Duration) -> Result<Self, AgentError> {
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        let service = tokio::time::timeout(request_timeout, ().serve(transport))
            .await
            .map_err(|_| AgentError::Transport {
                message: format!("timed out connecting to {url}"),
            })?
            .map_err(|e| AgentError::Transport {
                message: format!("failed to connect to {url}: {e}"),
            })?;

        info!(url, "connected to MCP server");
        Ok(Self {
            service,
            url: url.to_string(),
            request_timeout,
        })
    }

    /// Server endpoint this backend is connected to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Closes the session.
    pub async fn close(self) {
        if let Err(e) = self.service.cancel().await {
            debug!(error = %e, "MCP client shutdown failed");
        }
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<Result<T, ServiceError>, AgentError>
    where
        F: std::future::Future<Output = Result<T, ServiceError>> + Send,
    {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| AgentError::Transport {
                message: format!(
                    "{what} timed out after {}s",
                    self.request_timeout.as_secs()
                ),
            })
    }
}

impl std::fmt::Debug for McpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpBackend")
            .field("url", &self.url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolBackend for McpBackend {
    async fn declare(&self) -> Result<Vec<ToolDefinition>, AgentError> {
        let tools = self
            .bounded("tools/list", self.service.list_all_tools())
            .await?
            .map_err(|e| transport_error("tools/list", &e))?;
        debug!(count = tools.len(), "listed MCP tools");
        Ok(tools.into_iter().map(ToolDefinition::from).collect())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, AgentError> {
        let params: CallToolRequestParams =
            request_params(json!({ "name": name, "arguments": arguments }))?;

        match self
            .bounded("tools/call", self.service.call_tool(params))
            .await?
        {
            Ok(result) => tool_result_text(name, &result),
            Err(ServiceError::McpError(e)) => Err(AgentError::ToolExecution {
                name: name.to_string(),
                message: e.message.to_string(),
            }),
            Err(e) => Err(transport_error("tools/call", &e)),
        }
    }

    async fn read(&self, uri: &str) -> Result<String, AgentError> {
        let params: ReadResourceRequestParams = request_params(json!({ "uri": uri }))?;

        let result = match self
            .bounded("resources/read", self.service.read_resource(params))
            .await?
        {
            Ok(result) => result,
            Err(ServiceError::McpError(e)) => {
                return Err(AgentError::ResourceRead {
                    uri: uri.to_string(),
                    message: e.message.to_string(),
                });
            }
            Err(e) => return Err(transport_error("resources/read", &e)),
        };

        Ok(result
            .contents
            .into_iter()
            .find_map(|contents| {
                if let ResourceContents::TextResourceContents { text, .. } = contents {
                    Some(text)
                } else {
                    None
                }
            })
            .unwrap_or_default())
    }
}

/// Builds request parameters from JSON so optional protocol fields default.
fn request_params<T: DeserializeOwned>(value: Value) -> Result<T, AgentError> {
    serde_json::from_value(value).map_err(|e| AgentError::Transport {
        message: format!("failed to build request: {e}"),
    })
}

fn transport_error(what: &str, err: &ServiceError) -> AgentError {
    AgentError::Transport {
        message: format!("{what} failed: {err}"),
    }
}

/// First text content of a tool result; a result flagged as an error is a
/// recoverable tool failure.
fn tool_result_text(name: &str, result: &CallToolResult) -> Result<String, AgentError> {
    let text = result
        .content
        .iter()
        .find_map(|c| c.as_text())
        .map_or_else(|| NO_CONTENT.to_string(), |t| t.text.clone());

    if result.is_error == Some(true) {
        return Err(AgentError::ToolExecution {
            name: name.to_string(),
            message: text,
        });
    }
    Ok(text)
}
