//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::io::Write;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::agent::{
    AgentConfig, InputSource, LlmProvider, LocalBackend, McpBackend, PromptSet, Session,
    SessionOptions, StdinInput, Termination, ToolBackend, build_instruction, create_provider,
    prefetch_context,
};
use crate::cli::output::{
    OutputFormat, format_config_listing, format_document_list, format_tool_output,
};
use crate::cli::parser::{Cli, Commands, ConfigCommands, DocumentCommands, ServeCommands};
use crate::config::{ConfigKind, ConfigStore};
use crate::documents::DocumentStore;
use crate::error::{AgentError, CommandError, ConfigError, Result};
use crate::mcp::{IdpMcpServer, serve_http, serve_stdio};
use crate::service::{IdpService, RESOURCE_DOCUMENTS, TOOL_UPLOAD_DOCUMENT};

// ==================== Parameter Structs ====================

/// Parameters for the chat command.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatParams<'a> {
    /// MCP server endpoint override.
    pub server_url: Option<&'a str>,
    /// Run tools in-process instead of over MCP.
    pub local: bool,
    /// Document already stored on the server.
    pub document: Option<&'a str>,
    /// Local file to upload first.
    pub upload: Option<&'a Path>,
    /// Chat model override.
    pub model: Option<&'a str>,
    /// First request; asked interactively when absent.
    pub prompt: Option<&'a str>,
    /// Prompt override directory.
    pub prompt_dir: Option<&'a Path>,
}

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Serve(sub) => cmd_serve(sub, open_service(cli)?),
        Commands::Chat {
            server_url,
            local,
            document,
            upload,
            model,
            prompt,
            prompt_dir,
        } => {
            let params = ChatParams {
                server_url: server_url.as_deref(),
                local: *local,
                document: document.as_deref(),
                upload: upload.as_deref(),
                model: model.as_deref(),
                prompt: prompt.as_deref(),
                prompt_dir: prompt_dir.as_deref(),
            };
            cmd_chat(cli, &params)
        }
        Commands::Documents(sub) => {
            let store = DocumentStore::open(cli.get_data_dir())?;
            execute_documents(sub, &store, format)
        }
        Commands::Config(sub) => {
            let store = ConfigStore::new(cli.get_config_dir());
            execute_config(sub, &store, format)
        }
    }
}

/// Builds the service over the directories named on the command line.
fn open_service(cli: &Cli) -> Result<IdpService> {
    let documents = DocumentStore::open(cli.get_data_dir())?;
    let config = ConfigStore::new(cli.get_config_dir());
    debug!(
        data_dir = %documents.root().display(),
        config_dir = %config.root().display(),
        "opened stores"
    );
    Ok(IdpService::new(documents, config))
}

/// Dispatches document subcommands.
fn execute_documents(
    sub: &DocumentCommands,
    store: &DocumentStore,
    format: OutputFormat,
) -> Result<String> {
    match sub {
        DocumentCommands::List => cmd_list_documents(store, format),
        DocumentCommands::Upload { path, name } => {
            cmd_upload_document(store, path, name.as_deref(), format)
        }
        DocumentCommands::Extract { document_id } => {
            let text = store.extract_text(document_id)?;
            Ok(format_tool_output(document_id, &text, format))
        }
    }
}

/// Dispatches config subcommands.
fn execute_config(
    sub: &ConfigCommands,
    store: &ConfigStore,
    format: OutputFormat,
) -> Result<String> {
    let (label, id_key, kind) = match sub {
        ConfigCommands::Templates => ("templates", "template_id", ConfigKind::Templates),
        ConfigCommands::Rubrics => ("rubrics", "rubric_id", ConfigKind::Rubrics),
        ConfigCommands::Checklists => ("checklists", "checklist_id", ConfigKind::Checklists),
        ConfigCommands::Questions => ("question banks", "question_bank_id", ConfigKind::Questions),
        ConfigCommands::Schema { name } => return cmd_schema(store, name),
    };
    let listing = serde_json::to_string(&store.listing(kind)?)?;
    Ok(format_config_listing(label, id_key, &listing, format))
}

fn cmd_list_documents(store: &DocumentStore, format: OutputFormat) -> Result<String> {
    let names = store.list()?;
    Ok(format_document_list(&names, format))
}

fn cmd_upload_document(
    store: &DocumentStore,
    path: &Path,
    name: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to read {}: {e}", path.display()))
    })?;
    let name = name
        .map(str::to_string)
        .or_else(|| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .ok_or_else(|| {
            CommandError::ExecutionFailed(format!("{} has no file name", path.display()))
        })?;

    let stored = store.save_upload(&name, &bytes)?;
    info!(document = name, bytes = bytes.len(), "document uploaded");

    match format {
        OutputFormat::Text => Ok(format!("Uploaded '{name}' ({} bytes).\n", bytes.len())),
        OutputFormat::Json => Ok(format.to_json(&serde_json::json!({
            "document_id": name,
            "bytes": bytes.len(),
            "path": stored.to_string_lossy(),
        }))),
    }
}

fn cmd_schema(store: &ConfigStore, name: &str) -> Result<String> {
    match store.schema(name) {
        Ok(Some(schema)) => Ok(OutputFormat::Json.to_json(&schema)),
        Ok(None) | Err(ConfigError::InvalidName { .. }) => {
            Err(CommandError::ExecutionFailed(format!("Schema '{name}' not found.")).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Starts the MCP server with the specified transport.
///
/// Runs until the client disconnects (stdio) or the server is stopped
/// with Ctrl-C (HTTP).
fn cmd_serve(cmd: &ServeCommands, service: IdpService) -> Result<String> {
    let server = IdpMcpServer::new(service);

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    rt.block_on(async {
        match cmd {
            ServeCommands::Stdio => serve_stdio(server).await,
            ServeCommands::Http { host, port } => serve_http(server, host, *port).await,
        }
    })
    .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;

    Ok(String::new())
}

/// Runs an interactive chat session on stdin/stdout.
///
/// The model credential is checked before anything else; a session that
/// ends on an error returns it so the process exits non-zero.
fn cmd_chat(cli: &Cli, params: &ChatParams<'_>) -> Result<String> {
    let mut builder = AgentConfig::builder().from_env();
    if let Some(model) = params.model {
        builder = builder.model(model);
    }
    if let Some(url) = params.server_url {
        builder = builder.server_url(url);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }

    let config = builder.build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}"))
    })?;

    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let prompts = PromptSet::load(config.prompt_dir.as_deref());

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    let outcome = rt.block_on(chat_over_stdio(
        cli,
        provider.as_ref(),
        &config,
        &prompts,
        params,
    ))?;

    match outcome {
        None => Err(CommandError::ExecutionFailed("No document selected.".to_string()).into()),
        Some(Termination::Failed(e)) => Err(e.into()),
        Some(Termination::UserExit | Termination::EndOfInput) => Ok(String::new()),
    }
}

/// Connects the chosen backend and runs [`run_chat`] on stdin/stdout.
#[allow(clippy::future_not_send)]
async fn chat_over_stdio(
    cli: &Cli,
    provider: &dyn LlmProvider,
    config: &AgentConfig,
    prompts: &PromptSet,
    params: &ChatParams<'_>,
) -> Result<Option<Termination>> {
    let mut input = StdinInput;
    let mut out = std::io::stdout();

    if params.local {
        let backend = LocalBackend::new(open_service(cli)?);
        let outcome =
            run_chat(provider, &backend, config, prompts, params, &mut input, &mut out).await?;
        return Ok(outcome);
    }

    let backend = McpBackend::connect(&config.server_url, config.timeout).await?;
    info!(url = backend.url(), "chat session using remote tools");
    let outcome =
        run_chat(provider, &backend, config, prompts, params, &mut input, &mut out).await;
    backend.close().await;
    Ok(outcome?)
}

/// Drives one chat: pick a document, load context, then run the session.
///
/// Returns `None` when no document was selected (the reason has been
/// written to `out`).
///
/// # Errors
///
/// Returns an error if the backend cannot declare its tools or user input
/// cannot be read before the session starts. Failures inside the session
/// are reported through [`Termination::Failed`].
#[allow(clippy::future_not_send)]
pub async fn run_chat<W: Write>(
    provider: &dyn LlmProvider,
    backend: &dyn ToolBackend,
    config: &AgentConfig,
    prompts: &PromptSet,
    params: &ChatParams<'_>,
    input: &mut dyn InputSource,
    out: &mut W,
) -> std::result::Result<Option<Termination>, AgentError> {
    let Some(document_id) = select_document(backend, params, input, out).await? else {
        let _ = writeln!(out, "No document selected.");
        return Ok(None);
    };

    let tools = backend.declare().await?;

    let _ = writeln!(out, "\n--- Context Loading ---");
    let listings = prefetch_context(backend).await;
    let _ = writeln!(
        out,
        "Loaded {} configuration listing(s); {} tool(s) available.",
        listings.len(),
        tools.len()
    );

    let request = match params.prompt {
        Some(prompt) => Some(prompt.to_string()),
        None => input.read_line(&format!(
            "\nWhat would you like to do with '{document_id}'? (e.g., 'Assess the risk', 'Generate a checklist'): "
        ))?,
    };
    let Some(request) = request else {
        return Ok(Some(Termination::EndOfInput));
    };

    let instruction = build_instruction(&prompts.instruction, &document_id, &listings);
    let _ = writeln!(out, "\nStarting model + tool execution...");

    let mut session = Session::new(
        provider,
        backend,
        tools,
        SessionOptions::from_config(config),
        &mut *out,
    );
    let state = session.seed(&instruction, Some(&request))?;
    Ok(Some(session.run(state, input).await))
}

/// Resolves the document for the session from flags or the menu.
#[allow(clippy::future_not_send)]
async fn select_document<W: Write>(
    backend: &dyn ToolBackend,
    params: &ChatParams<'_>,
    input: &mut dyn InputSource,
    out: &mut W,
) -> std::result::Result<Option<String>, AgentError> {
    if let Some(document) = params.document {
        return Ok(Some(document.to_string()));
    }
    if let Some(path) = params.upload {
        return Ok(upload_file(backend, path, out).await);
    }

    let _ = writeln!(out, "\n--- Intelligent Document Processing Client ---");
    let _ = writeln!(out, "1. Upload a document");
    let _ = writeln!(out, "2. Use existing server document");

    let choice = input.read_line("Choose option (1/2): ")?.unwrap_or_default();
    let document_id = match choice.trim() {
        "1" => match input.read_line("Enter local file path: ")? {
            Some(path) => upload_file(backend, Path::new(path.trim()), out).await,
            None => None,
        },
        "2" => {
            let _ = writeln!(out, "\nUpdating document list from server...");
            match backend.read(RESOURCE_DOCUMENTS).await {
                Ok(listing) => {
                    let _ = writeln!(out, "Available documents: {listing}");
                }
                Err(e) => {
                    let _ = writeln!(out, "Error listing documents: {e}");
                    return Ok(None);
                }
            }
            input.read_line("Enter document ID from above: ")?
        }
        _ => {
            let _ = writeln!(out, "Invalid choice.");
            return Ok(None);
        }
    };

    Ok(document_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty()))
}

/// Uploads a local file through the `upload_document` tool.
///
/// Returns the stored document id, or `None` after writing the reason to
/// `out`. A server reply starting with `Error` counts as a failed upload.
#[allow(clippy::future_not_send)]
pub async fn upload_file<W: Write>(
    backend: &dyn ToolBackend,
    path: &Path,
    out: &mut W,
) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let _ = writeln!(out, "Error: File '{}' not found.", path.display());
            return None;
        }
        Err(e) => {
            let _ = writeln!(out, "Upload failed: {e}");
            return None;
        }
    };

    let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
        let _ = writeln!(out, "Upload failed: '{}' has no file name", path.display());
        return None;
    };

    let _ = writeln!(out, "Uploading {filename}...");
    let mut arguments = Map::new();
    arguments.insert("filename".to_string(), Value::String(filename.clone()));
    arguments.insert(
        "file_content_base64".to_string(),
        Value::String(BASE64.encode(&bytes)),
    );

    match backend.invoke(TOOL_UPLOAD_DOCUMENT, arguments).await {
        Ok(response) => {
            let _ = writeln!(out, "Server response: {response}");
            if response.starts_with("Error") {
                None
            } else {
                Some(filename)
            }
        }
        Err(e) => {
            let _ = writeln!(out, "Upload failed: {e}");
            None
        }
    }
}
