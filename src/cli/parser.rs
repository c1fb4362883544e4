//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_DIR;
use crate::documents::DEFAULT_DATA_DIR;

/// IDP-MCP: intelligent document processing over the Model Context Protocol.
///
/// Serves document extraction, templated summaries, risk rubrics, and action
/// checklists as MCP tools, and drives them from an LLM chat client.
#[derive(Parser, Debug)]
#[command(name = "idp-mcp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding uploaded documents.
    ///
    /// Defaults to `data` in the current directory.
    #[arg(long, env = "DATA_PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding templates, rubrics, checklists, questions, and schemas.
    ///
    /// Defaults to `configs` in the current directory.
    #[arg(long, env = "CONFIG_PATH", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP server.
    #[command(subcommand)]
    Serve(ServeCommands),

    /// Chat with an LLM that calls the document tools.
    ///
    /// Without `--document` or `--upload`, an interactive menu asks whether
    /// to upload a file or pick a document already on the server. Type
    /// `exit` or `quit` to end the session.
    #[command(after_help = r#"Examples:
  idp-mcp chat                                       # Menu, remote server at IDP_SERVER_URL
  idp-mcp chat --local --document sample_loan.txt    # In-process tools, no server
  idp-mcp chat --upload ./loan.pdf --prompt "Assess the risk"
  idp-mcp chat --server-url http://10.0.0.5:8000/mcp --model gpt-4o
"#)]
    Chat {
        /// MCP server endpoint (default: `IDP_SERVER_URL` or http://localhost:8000/mcp).
        #[arg(long, conflicts_with = "local")]
        server_url: Option<String>,

        /// Run the tools in-process instead of connecting to a server.
        #[arg(long)]
        local: bool,

        /// Document ID already stored on the server.
        #[arg(short, long, conflicts_with = "upload")]
        document: Option<String>,

        /// Local file to upload before chatting.
        #[arg(short, long)]
        upload: Option<PathBuf>,

        /// Chat model (default: `IDP_MODEL` or gpt-4o-mini).
        #[arg(short, long)]
        model: Option<String>,

        /// First request; asked interactively when omitted.
        #[arg(short, long)]
        prompt: Option<String>,

        /// Directory containing an `instruction.md` prompt override.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,
    },

    /// Inspect and manage stored documents.
    #[command(subcommand)]
    Documents(DocumentCommands),

    /// Inspect the configuration served as resources.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// MCP server transports.
#[derive(Subcommand, Debug)]
pub enum ServeCommands {
    /// Start MCP server with stdio transport.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  idp-mcp serve stdio
  idp-mcp --data-dir /srv/idp/data serve stdio
"#)]
    Stdio,

    /// Start MCP server with streamable HTTP transport at `/mcp`.
    #[command(after_help = r#"Examples:
  idp-mcp serve http                        # Listen on 0.0.0.0:8000
  idp-mcp serve http --host 127.0.0.1 --port 9000
"#)]
    Http {
        /// Host to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to.
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

/// Document subcommands.
#[derive(Subcommand, Debug)]
pub enum DocumentCommands {
    /// List stored documents.
    #[command(alias = "ls")]
    List,

    /// Copy a local file into document storage.
    Upload {
        /// File to upload.
        path: PathBuf,

        /// Stored name (defaults to the file name).
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print the extracted text of a stored document.
    Extract {
        /// Document ID.
        document_id: String,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// List summary templates.
    Templates,
    /// List risk rubrics.
    Rubrics,
    /// List action checklists.
    Checklists,
    /// List question banks.
    Questions,
    /// Show a JSON output schema.
    Schema {
        /// Schema name (file stem under `schemas/`).
        name: String,
    },
}

impl Cli {
    /// Returns the document directory, defaulting to `data`.
    #[must_use]
    pub fn get_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Returns the configuration directory, defaulting to `configs`.
    #[must_use]
    pub fn get_config_dir(&self) -> PathBuf {
        self.config_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("idp-mcp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_dirs() {
        let cli = Cli {
            data_dir: None,
            config_dir: None,
            verbose: false,
            format: "text".to_string(),
            command: Commands::Serve(ServeCommands::Stdio),
        };
        assert_eq!(cli.get_data_dir(), PathBuf::from("data"));
        assert_eq!(cli.get_config_dir(), PathBuf::from("configs"));
    }

    #[test]
    fn test_serve_http_defaults() {
        let cli = parse(&["serve", "http"]);
        match cli.command {
            Commands::Serve(ServeCommands::Http { host, port }) => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 8000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_chat_flags() {
        let cli = parse(&[
            "--config-dir",
            "/etc/idp",
            "chat",
            "--local",
            "-d",
            "loan.pdf",
            "-p",
            "Assess the risk",
        ]);
        assert_eq!(cli.get_config_dir(), PathBuf::from("/etc/idp"));
        match cli.command {
            Commands::Chat {
                local,
                document,
                prompt,
                server_url,
                ..
            } => {
                assert!(local);
                assert_eq!(document.as_deref(), Some("loan.pdf"));
                assert_eq!(prompt.as_deref(), Some("Assess the risk"));
                assert!(server_url.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_chat_conflicting_flags() {
        let args = ["idp-mcp", "chat", "--local", "--server-url", "http://x/mcp"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = ["idp-mcp", "chat", "--document", "a.txt", "--upload", "b.txt"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_config_schema() {
        let cli = parse(&["--format", "json", "config", "schema", "loan_output"]);
        assert_eq!(cli.format, "json");
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Schema { ref name }) if name == "loan_output"
        ));
    }
}
