//! CLI layer for idp-mcp.
//!
//! Provides the command-line interface using clap, with commands for
//! serving the tools over MCP, chatting with them through an LLM, and
//! inspecting documents and configuration locally.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{ChatParams, execute, run_chat, upload_file};
pub use output::OutputFormat;
pub use parser::{Cli, Commands, ConfigCommands, DocumentCommands, ServeCommands};
