//! MCP server implementation for idp-mcp.
//!
//! Exposes the document tools and configuration listings as MCP tools and
//! resources. Tool bodies touch the filesystem (and PDF parsing can be
//! slow), so they run on the blocking pool via `spawn_blocking`.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourceTemplatesResult,
    ListResourcesResult, PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
    ReadResourceRequestParams, ReadResourceResult, ResourceContents, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};
use tracing::debug;

use crate::error::Error;
use crate::service::{
    IdpService, RESOURCE_CHECKLISTS, RESOURCE_DOCUMENTS, RESOURCE_QUESTIONS, RESOURCE_RUBRICS,
    RESOURCE_TEMPLATES,
};

use super::params::{
    DEFAULT_CHECKLIST_ID, DEFAULT_RUBRIC_ID, ExtractDocumentParams, GenerateChecklistParams,
    IdentifyRisksParams, SummarizeSectionsParams, UploadDocumentParams,
};

/// Static resources: (uri, name, description).
const STATIC_RESOURCES: [(&str, &str, &str); 5] = [
    (
        RESOURCE_DOCUMENTS,
        "Documents",
        "List available documents in the system.",
    ),
    (
        RESOURCE_TEMPLATES,
        "Templates",
        "List available extraction templates.",
    ),
    (RESOURCE_RUBRICS, "Rubrics", "List available risk rubrics."),
    (
        RESOURCE_CHECKLISTS,
        "Checklists",
        "List available action checklists.",
    ),
    (
        RESOURCE_QUESTIONS,
        "Question banks",
        "List available review question banks.",
    ),
];

/// IDP MCP server.
///
/// Provides MCP tools for document upload, extraction, summarization, risk
/// identification, and checklist generation, plus MCP resources for the
/// document and configuration listings.
#[derive(Clone)]
pub struct IdpMcpServer {
    tool_router: ToolRouter<Self>,
    service: IdpService,
}

#[tool_router]
impl IdpMcpServer {
    /// Store a base64-encoded document under a file name.
    #[tool(
        name = "upload_document",
        description = "Upload a document. Decodes the base64 file content and stores it under the given filename, which can then be used as document_id in other tools."
    )]
    async fn upload_document(
        &self,
        Parameters(params): Parameters<UploadDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |service| {
            service.upload_document(&params.filename, &params.file_content_base64)
        })
        .await
    }

    /// Extract the raw text of a document.
    #[tool(
        name = "extract_document",
        description = "Extract raw text from a document. document_id is the filename of the document (e.g., 'loan_app.pdf')."
    )]
    async fn extract_document(
        &self,
        Parameters(params): Parameters<ExtractDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |service| service.extract_document(&params.document_id))
            .await
    }

    /// Apply a template's extraction rules to a document.
    #[tool(
        name = "summarize_sections",
        description = "Extract sections from a document based on a template for summarization. Returns JSON with the extracted sections and a raw text snippet."
    )]
    async fn summarize_sections(
        &self,
        Parameters(params): Parameters<SummarizeSectionsParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |service| {
            service.summarize_sections(&params.document_id, &params.template_id)
        })
        .await
    }

    /// Evaluate a risk rubric against a document.
    #[tool(
        name = "identify_risks",
        description = "Identify potential risks in a document based on a risk rubric (default: loan_risk_v1). Returns JSON with the identified risks."
    )]
    async fn identify_risks(
        &self,
        Parameters(params): Parameters<IdentifyRisksParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |service| {
            let rubric_id = params.rubric_id.as_deref().unwrap_or(DEFAULT_RUBRIC_ID);
            service.identify_risks(&params.document_id, rubric_id)
        })
        .await
    }

    /// Build the action checklist for a document.
    #[tool(
        name = "generate_action_checklist",
        description = "Generate a checklist of actions for a document from a configured checklist (default: loan_checklist_v1). Returns JSON with the ordered checklist."
    )]
    async fn generate_action_checklist(
        &self,
        Parameters(params): Parameters<GenerateChecklistParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |service| {
            let checklist_id = params
                .checklist_id
                .as_deref()
                .unwrap_or(DEFAULT_CHECKLIST_ID);
            service.generate_action_checklist(&params.document_id, checklist_id)
        })
        .await
    }
}

#[tool_handler]
impl ServerHandler for IdpMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "idp-server".to_string(),
                title: Some("Intelligent Document Processing MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Intelligent document processing: extract text, summarize sections with \
                 templates, identify risks with rubrics, and generate action checklists. \
                 Browse documents and configuration via resources."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = STATIC_RESOURCES
            .iter()
            .map(|(uri, name, description)| {
                let mut raw = RawResource::new(*uri, *name);
                raw.description = Some((*description).to_string());
                raw.mime_type = Some("application/json".to_string());
                raw.no_annotation()
            })
            .collect();

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParams { uri, .. }: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let service = self.service.clone();
        let request_uri = uri.clone();

        let content = tokio::task::spawn_blocking(move || service.read_resource(&request_uri))
            .await
            .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?
            .map_err(|e| match e {
                Error::UnknownResource { uri } => {
                    McpError::resource_not_found(format!("Resource not found: {uri}"), None)
                }
                other => McpError::internal_error(format!("Resource read failed: {other}"), None),
            })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(content, uri)],
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let schema_template = RawResourceTemplate {
            uri_template: "config://schemas/{schema_name}".to_string(),
            name: "Output schema".to_string(),
            title: None,
            description: Some(
                "Get a specific output schema by name (e.g., loan_output). Returns \"Schema not found.\" for unknown names."
                    .to_string(),
            ),
            mime_type: Some("application/json".to_string()),
            icons: None,
        };

        Ok(ListResourceTemplatesResult {
            resource_templates: vec![schema_template.no_annotation()],
            next_cursor: None,
            meta: None,
        })
    }
}

impl IdpMcpServer {
    /// Creates a new MCP server over the given service.
    #[must_use]
    pub fn new(service: IdpService) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
        }
    }

    /// Returns the underlying service.
    #[must_use]
    pub const fn service(&self) -> &IdpService {
        &self.service
    }

    /// Declarations of every registered tool, as served by `tools/list`.
    #[must_use]
    pub fn tools(&self) -> Vec<rmcp::model::Tool> {
        self.tool_router.list_all()
    }

    /// Runs a tool body on the blocking pool and wraps its text result.
    async fn run<F>(&self, f: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&IdpService) -> String + Send + 'static,
    {
        let service = self.service.clone();
        let text = tokio::task::spawn_blocking(move || f(&service))
            .await
            .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?;

        debug!(bytes = text.len(), "tool call complete");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::documents::DocumentStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, IdpMcpServer) {
        let dir = TempDir::new().unwrap();
        let documents = DocumentStore::open(dir.path().join("data")).unwrap();
        let config = ConfigStore::new(dir.path().join("configs"));
        let server = IdpMcpServer::new(IdpService::new(documents, config));
        (dir, server)
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_registers_all_tools() {
        let (_dir, server) = setup();
        let names: Vec<String> = server
            .tools()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        for expected in [
            "upload_document",
            "extract_document",
            "summarize_sections",
            "identify_risks",
            "generate_action_checklist",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_extract_missing_document_is_text_result() {
        let (_dir, server) = setup();
        let result = server
            .extract_document(Parameters(ExtractDocumentParams {
                document_id: "sample_loan.txt".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(
            text_of(&result),
            "Error: Document 'sample_loan.txt' not found."
        );
    }

    #[tokio::test]
    async fn test_identify_risks_uses_default_rubric() {
        let (_dir, server) = setup();
        server
            .service()
            .documents()
            .save_upload("doc.txt", b"unsigned")
            .unwrap();
        let result = server
            .identify_risks(Parameters(IdentifyRisksParams {
                document_id: "doc.txt".to_string(),
                rubric_id: None,
            }))
            .await
            .unwrap();
        assert_eq!(text_of(&result), "Error: Rubric 'loan_risk_v1' not found.");
    }
}
