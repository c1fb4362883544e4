//! LLM chat client that drives the document tools.
//!
//! The client keeps one conversation per session and alternates between
//! model calls and tool dispatch until the model answers in text. Tools and
//! resources come from a [`ToolBackend`]: a remote MCP server or the
//! in-process service.
//!
//! # Architecture
//!
//! ```text
//! chat command
//!   ├── ToolBackend (McpBackend | LocalBackend)
//!   │     ├── declare → ToolDefinitions (fixed for the session)
//!   │     └── read    → configuration listings for the instruction
//!   └── Session (LoopState machine)
//!         ├── LlmProvider::chat over ConversationHistory
//!         ├── ToolExecutor → one ToolResult per ToolCall, in order
//!         └── InputSource → next user turn, or exit
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod executor;
pub mod history;
pub mod mcp_client;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod session;
pub mod tool;

// Re-export key types
pub use backend::{LocalBackend, ToolBackend};
pub use client::create_provider;
pub use config::AgentConfig;
pub use executor::ToolExecutor;
pub use history::{ConversationHistory, Turn};
pub use mcp_client::McpBackend;
pub use message::{ChatMessage, ChatRequest, ChatResponse, ModelReply, Role, TokenUsage};
pub use prompt::{ContextListing, PromptSet, build_instruction};
pub use provider::LlmProvider;
pub use session::{
    InputSource, LoopState, Session, SessionOptions, StdinInput, Termination, prefetch_context,
};
pub use tool::{ToolCall, ToolDefinition, ToolResult};
