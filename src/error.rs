//! Error types for idp-mcp.
//!
//! Each layer owns a `thiserror` enum. Document and config failures are
//! recoverable from the conversation's point of view: the tool layer turns
//! them into `"Error: ..."` result strings so the model can adapt. Agent
//! errors split into recoverable tool failures and fatal transport or
//! protocol failures (see [`AgentError::is_recoverable`]).

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by CLI commands and other top-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Document storage or extraction failure.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Configuration loading failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Agent / orchestration failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A resource URI that the server does not expose.
    #[error("unknown resource: {uri}")]
    UnknownResource {
        /// Requested URI.
        uri: String,
    },

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Raw I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The named document does not exist in storage.
    #[error("Document {name} not found.")]
    NotFound {
        /// Requested document name.
        name: String,
    },

    /// The document name would escape the storage root or is empty.
    #[error("invalid document name: '{name}'")]
    InvalidName {
        /// Rejected name.
        name: String,
    },

    /// Upload payload could not be decoded.
    #[error("Invalid base64 content: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// Format-specific extraction failed.
    #[error("{format} extraction failed: {message}")]
    Extraction {
        /// Format label (e.g. `"PDF"`).
        format: &'static str,
        /// Underlying parser message.
        message: String,
    },

    /// Underlying filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved in the failing operation.
        path: PathBuf,
        /// Source error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    /// A config file could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A lookup name contained path components.
    #[error("invalid config name: '{name}'")]
    InvalidName {
        /// Rejected name.
        name: String,
    },
}

/// Errors raised by the agent client and its orchestration loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured for the model provider.
    #[error("API key missing: set OPENAI_API_KEY or IDP_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name is unknown.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name.
        name: String,
    },

    /// The model API call failed.
    #[error("model request failed: {message}")]
    ApiRequest {
        /// Error message from the SDK.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The model call exceeded its time bound.
    #[error("model request timed out after {seconds}s")]
    Timeout {
        /// Configured bound in seconds.
        seconds: u64,
    },

    /// The tool/resource backend connection failed.
    #[error("backend transport error: {message}")]
    Transport {
        /// Transport message.
        message: String,
    },

    /// The model returned neither text nor function calls.
    #[error("model response contained neither text nor function calls")]
    ProtocolViolation,

    /// The requested tool is not registered.
    #[error("unknown tool '{name}'")]
    ToolNotFound {
        /// Tool name requested by the model.
        name: String,
    },

    /// A tool ran and failed.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Failure description.
        message: String,
    },

    /// The model kept requesting tools past the round limit.
    #[error("tool loop exceeded {max_iterations} rounds without a final answer")]
    ToolLoopExceeded {
        /// Configured limit.
        max_iterations: usize,
    },

    /// A resource could not be read from the backend.
    #[error("failed to read resource {uri}: {message}")]
    ResourceRead {
        /// Resource URI.
        uri: String,
        /// Failure description.
        message: String,
    },

    /// Appending a turn would break the call/result pairing.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Reading user input failed.
    #[error("failed to read user input: {0}")]
    InvalidInput(String),
}

impl AgentError {
    /// Returns `true` for failures the conversation can absorb as a tool
    /// result. Everything else terminates the session.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. } | Self::ToolExecution { .. })
    }
}

/// Rejected appends to the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A text turn or new batch was appended while calls were unanswered.
    #[error("{pending} tool call(s) still awaiting results")]
    CallsPending {
        /// Number of unanswered calls.
        pending: usize,
    },

    /// A result did not answer the next pending call.
    #[error("unexpected tool result for call '{tool_call_id}'")]
    UnexpectedResult {
        /// Call ID carried by the rejected result.
        tool_call_id: String,
    },

    /// A call batch contained no calls.
    #[error("tool call batch is empty")]
    EmptyBatch,
}

/// Errors raised by CLI command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}
