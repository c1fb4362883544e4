//! MCP (Model Context Protocol) server for idp-mcp.
//!
//! Exposes document processing tools and configuration listings to MCP
//! clients (the bundled `chat` client or any other MCP-capable agent).
//!
//! # Architecture
//!
//! ```text
//! MCP Client
//!   ↓ call_tool / read_resource
//! IdpMcpServer
//!   ↓ spawn_blocking
//! IdpService
//!   ├── DocumentStore (data dir: upload, extract)
//!   └── ConfigStore (config dir: templates, rubrics, checklists, questions, schemas)
//! ```

pub mod params;
pub mod server;
pub mod transport;

pub use params::{
    DEFAULT_CHECKLIST_ID, DEFAULT_RUBRIC_ID, ExtractDocumentParams, GenerateChecklistParams, IdentifyRisksParams, SummarizeSectionsParams,
    UploadDocumentParams,
};
pub use server::IdpMcpServer;
pub use transport::{serve_http, serve_http_on, serve_stdio};
