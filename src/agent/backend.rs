//! Tool and resource backends for the chat session.
//!
//! A [`ToolBackend`] is the session's view of the server: it declares the
//! tools once, invokes them by name, and reads resources. The session does
//! not care whether the tools live behind an MCP connection
//! ([`McpBackend`](super::mcp_client::McpBackend)) or in this process
//! ([`LocalBackend`]).
//!
//! Error classification matters here: a failure the model can recover from
//! (bad arguments, unknown tool, tool-reported error) is
//! [`AgentError::ToolNotFound`] or [`AgentError::ToolExecution`]; a broken
//! connection is [`AgentError::Transport`] and ends the session.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::tool::ToolDefinition;
use crate::error::{AgentError, Error};
use crate::mcp::{
    DEFAULT_CHECKLIST_ID, DEFAULT_RUBRIC_ID, ExtractDocumentParams, GenerateChecklistParams,
    IdentifyRisksParams, IdpMcpServer, SummarizeSectionsParams, UploadDocumentParams,
};
use crate::service::{
    IdpService, TOOL_EXTRACT_DOCUMENT, TOOL_GENERATE_ACTION_CHECKLIST, TOOL_IDENTIFY_RISKS,
    TOOL_SUMMARIZE_SECTIONS, TOOL_UPLOAD_DOCUMENT,
};

/// Tool registry plus resource provider.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Lists the tools the backend can invoke.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Transport`] if the backend is unreachable.
    async fn declare(&self) -> Result<Vec<ToolDefinition>, AgentError>;

    /// Invokes a tool and returns its text result.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error for tool-level failures and
    /// [`AgentError::Transport`] for connection failures.
    async fn invoke(&self, name: &str, arguments: Map<String, Value>)
    -> Result<String, AgentError>;

    /// Reads a resource by URI.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ResourceRead`] for unknown resources and
    /// [`AgentError::Transport`] for connection failures.
    async fn read(&self, uri: &str) -> Result<String, AgentError>;
}

/// In-process backend over an [`IdpService`].
///
/// Declares exactly the tools the MCP server registers, so a local session
/// sees the same schemas a remote one would.
#[derive(Clone)]
pub struct LocalBackend {
    server: IdpMcpServer,
}

impl LocalBackend {
    /// Creates a backend over the given service.
    #[must_use]
    pub fn new(service: IdpService) -> Self {
        Self {
            server: IdpMcpServer::new(service),
        }
    }

    fn service(&self) -> IdpService {
        self.server.service().clone()
    }
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolBackend for LocalBackend {
    async fn declare(&self) -> Result<Vec<ToolDefinition>, AgentError> {
        Ok(self
            .server
            .tools()
            .into_iter()
            .map(ToolDefinition::from)
            .collect())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, AgentError> {
        let service = self.service();
        match name {
            TOOL_UPLOAD_DOCUMENT => {
                let p: UploadDocumentParams = parse_params(name, arguments)?;
                run_blocking(name, move || {
                    service.upload_document(&p.filename, &p.file_content_base64)
                })
                .await
            }
            TOOL_EXTRACT_DOCUMENT => {
                let p: ExtractDocumentParams = parse_params(name, arguments)?;
                run_blocking(name, move || service.extract_document(&p.document_id)).await
            }
            TOOL_SUMMARIZE_SECTIONS => {
                let p: SummarizeSectionsParams = parse_params(name, arguments)?;
                run_blocking(name, move || {
                    service.summarize_sections(&p.document_id, &p.template_id)
                })
                .await
            }
            TOOL_IDENTIFY_RISKS => {
                let p: IdentifyRisksParams = parse_params(name, arguments)?;
                run_blocking(name, move || {
                    let rubric_id = p.rubric_id.as_deref().unwrap_or(DEFAULT_RUBRIC_ID);
                    service.identify_risks(&p.document_id, rubric_id)
                })
                .await
            }
            TOOL_GENERATE_ACTION_CHECKLIST => {
                let p: GenerateChecklistParams = parse_params(name, arguments)?;
                run_blocking(name, move || {
                    let checklist_id = p.checklist_id.as_deref().unwrap_or(DEFAULT_CHECKLIST_ID);
                    service.generate_action_checklist(&p.document_id, checklist_id)
                })
                .await
            }
            other => Err(AgentError::ToolNotFound {
                name: other.to_string(),
            }),
        }
    }

    async fn read(&self, uri: &str) -> Result<String, AgentError> {
        let service = self.service();
        let request_uri = uri.to_string();
        tokio::task::spawn_blocking(move || service.read_resource(&request_uri))
            .await
            .map_err(|e| AgentError::ResourceRead {
                uri: uri.to_string(),
                message: format!("task join error: {e}"),
            })?
            .map_err(|e| AgentError::ResourceRead {
                uri: uri.to_string(),
                message: match e {
                    Error::UnknownResource { .. } => "resource not found".to_string(),
                    other => other.to_string(),
                },
            })
    }
}

fn parse_params<T: DeserializeOwned>(
    name: &str,
    arguments: Map<String, Value>,
) -> Result<T, AgentError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|e| AgentError::ToolExecution {
        name: name.to_string(),
        message: format!("invalid arguments: {e}"),
    })
}

async fn run_blocking<F>(name: &str, f: F) -> Result<String, AgentError>
where
    F: FnOnce() -> String + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AgentError::ToolExecution {
            name: name.to_string(),
            message: format!("task join error: {e}"),
        })
}
