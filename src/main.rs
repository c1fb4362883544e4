//! idp-mcp command-line entry point.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use idp_mcp::cli::{Cli, execute};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr: stdout carries MCP frames (stdio) or the chat transcript.
    let default_filter = if cli.verbose { "idp_mcp=debug,info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match execute(&cli) {
        Ok(output) => {
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{output}");
            let _ = stdout.flush();
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Error: {e}");
            ExitCode::FAILURE
        }
    }
}
