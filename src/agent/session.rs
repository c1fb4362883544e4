//! Interactive tool-calling session.
//!
//! The session is an explicit state machine:
//!
//! ```text
//!            seed (instruction + request)
//!                      │
//!                      ▼
//!  ┌────────────► AwaitingModel ──── calls ────► DispatchingTools
//!  │                   │  ▲                              │
//!  │                 text └──────── all results ─────────┘
//!  │                   ▼
//!  └── user input ─ AwaitingUser ── exit / EOF ──► Terminated
//! ```
//!
//! Any fatal error (model transport, timeout, protocol violation, backend
//! connection loss, tool round cap) moves straight to `Terminated` without
//! appending to the history. Tool failures are not fatal: they come back
//! from the executor as error results and the model sees them.

use std::io::Write;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::backend::ToolBackend;
use super::config::AgentConfig;
use super::executor::ToolExecutor;
use super::history::ConversationHistory;
use super::message::{ChatRequest, ModelReply};
use super::prompt::ContextListing;
use super::provider::LlmProvider;
use super::tool::ToolDefinition;
use crate::error::AgentError;
use crate::service::{RESOURCE_CHECKLISTS, RESOURCE_QUESTIONS, RESOURCE_RUBRICS, RESOURCE_TEMPLATES};

/// Characters of a tool result shown in the transcript.
pub const DISPLAY_LIMIT: usize = 100;

/// Inputs that end the session from `AwaitingUser`.
pub const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// Configuration listings prefetched into the instruction turn.
pub const CONTEXT_RESOURCES: [&str; 4] = [
    RESOURCE_TEMPLATES,
    RESOURCE_RUBRICS,
    RESOURCE_CHECKLISTS,
    RESOURCE_QUESTIONS,
];

/// Prompt shown when waiting for user input.
const USER_PROMPT: &str = "\nYou: ";

/// Where the session is in its request/response cycle.
#[derive(Debug)]
pub enum LoopState {
    /// The next step is a model call over the full history.
    AwaitingModel,
    /// The latest call batch has pending calls to dispatch.
    DispatchingTools,
    /// The model answered; waiting for the user.
    AwaitingUser,
    /// The session is over.
    Terminated(Termination),
}

/// Why a session ended.
#[derive(Debug)]
pub enum Termination {
    /// The user typed an exit command.
    UserExit,
    /// User input reached end of file.
    EndOfInput,
    /// An unrecoverable error.
    Failed(AgentError),
}

impl Termination {
    /// Returns `true` unless the session ended on an error.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Source of user input lines.
pub trait InputSource {
    /// Shows `prompt` and reads one line. `Ok(None)` means end of input.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidInput`] if reading fails.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, AgentError>;
}

/// Reads user input from stdin, prompting on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinInput;

impl InputSource for StdinInput {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, AgentError> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")
            .and_then(|()| stdout.flush())
            .map_err(|e| AgentError::InvalidInput(e.to_string()))?;

        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
            Err(e) => Err(AgentError::InvalidInput(e.to_string())),
        }
    }
}

/// Per-session model settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Chat model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens per response.
    pub max_tokens: Option<u32>,
    /// Bound on a single model call.
    pub model_timeout: Duration,
    /// Maximum consecutive tool rounds before the model must answer.
    pub max_tool_rounds: usize,
}

impl SessionOptions {
    /// Derives session options from the client configuration.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            model_timeout: config.timeout,
            max_tool_rounds: config.max_tool_rounds,
        }
    }
}

/// One interactive run: a history, a model, a tool backend, and a transcript.
pub struct Session<'a, W: Write> {
    provider: &'a dyn LlmProvider,
    executor: ToolExecutor<'a>,
    tools: Vec<ToolDefinition>,
    options: SessionOptions,
    history: ConversationHistory,
    tool_rounds: usize,
    model_calls: usize,
    out: W,
}

impl<'a, W: Write> Session<'a, W> {
    /// Creates a session over the declared `tools`.
    pub fn new(
        provider: &'a dyn LlmProvider,
        backend: &'a dyn ToolBackend,
        tools: Vec<ToolDefinition>,
        options: SessionOptions,
        out: W,
    ) -> Self {
        Self {
            provider,
            executor: ToolExecutor::new(backend, &tools),
            tools,
            options,
            history: ConversationHistory::new(),
            tool_rounds: 0,
            model_calls: 0,
            out,
        }
    }

    /// Seeds the history with the instruction and the user's first request.
    ///
    /// Returns the state to run from: `AwaitingModel` when a request was
    /// given, `AwaitingUser` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::History`] if the session was already seeded
    /// and has unanswered calls.
    pub fn seed(&mut self, instruction: &str, request: Option<&str>) -> Result<LoopState, AgentError> {
        self.history.push_instruction(instruction)?;
        match request.map(str::trim).filter(|r| !r.is_empty()) {
            Some(request) => {
                self.history.push_user(request)?;
                Ok(LoopState::AwaitingModel)
            }
            None => Ok(LoopState::AwaitingUser),
        }
    }

    /// Runs from `state` until the session terminates.
    #[allow(clippy::future_not_send)]
    pub async fn run(&mut self, mut state: LoopState, input: &mut dyn InputSource) -> Termination {
        loop {
            state = self.step(state, input).await;
            if let LoopState::Terminated(termination) = state {
                info!(
                    model_calls = self.model_calls,
                    turns = self.history.len(),
                    "session ended"
                );
                return termination;
            }
        }
    }

    /// Performs one transition.
    #[allow(clippy::future_not_send)]
    pub async fn step(&mut self, state: LoopState, input: &mut dyn InputSource) -> LoopState {
        match state {
            LoopState::AwaitingModel => self.await_model().await,
            LoopState::DispatchingTools => self.dispatch_tools().await,
            LoopState::AwaitingUser => self.await_user(input),
            terminated @ LoopState::Terminated(_) => terminated,
        }
    }

    /// The conversation so far.
    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Number of model invocations made.
    #[must_use]
    pub const fn model_calls(&self) -> usize {
        self.model_calls
    }

    /// Consumes the session, returning the transcript writer.
    pub fn into_output(self) -> W {
        self.out
    }

    async fn await_model(&mut self) -> LoopState {
        let request = ChatRequest {
            model: self.options.model.clone(),
            messages: self.history.to_messages(),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            tools: self.tools.clone(),
        };

        self.model_calls += 1;
        let response = match tokio::time::timeout(
            self.options.model_timeout,
            self.provider.chat(&request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return self.fail(e),
            Err(_) => {
                return self.fail(AgentError::Timeout {
                    seconds: self.options.model_timeout.as_secs(),
                });
            }
        };

        debug!(
            total_tokens = response.usage.total_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "model responded"
        );

        match response.into_reply() {
            ModelReply::ToolCalls { content, calls } => {
                self.tool_rounds += 1;
                if self.tool_rounds > self.options.max_tool_rounds {
                    return self.fail(AgentError::ToolLoopExceeded {
                        max_iterations: self.options.max_tool_rounds,
                    });
                }
                debug!(tool_count = calls.len(), round = self.tool_rounds, "model requested tools");
                match self.history.push_call_batch(content, calls) {
                    Ok(()) => LoopState::DispatchingTools,
                    Err(e) => self.fail(e.into()),
                }
            }
            ModelReply::Text(text) => {
                if let Err(e) = self.history.push_model_text(text.as_str()) {
                    return self.fail(e.into());
                }
                self.tool_rounds = 0;
                let _ = writeln!(self.out, "\nFinal Answer:\n{text}");
                LoopState::AwaitingUser
            }
            ModelReply::Empty => {
                warn!("model returned neither text nor function calls");
                let _ = writeln!(
                    self.out,
                    "\nLoop ended unexpectedly (no text, no function calls)."
                );
                LoopState::Terminated(Termination::Failed(AgentError::ProtocolViolation))
            }
        }
    }

    async fn dispatch_tools(&mut self) -> LoopState {
        let calls = self.history.pending_calls().to_vec();
        for call in &calls {
            let _ = writeln!(self.out, "\nModel calls tool: {}", call.name);
            let _ = writeln!(self.out, "Args: {}", call.arguments);

            let result = match self.executor.execute(call).await {
                Ok(result) => result,
                Err(e) => return self.fail(e),
            };

            let _ = writeln!(
                self.out,
                "   -> Tool Result: {}",
                truncate_for_display(&result.content, DISPLAY_LIMIT)
            );
            if let Err(e) = self.history.push_result(result) {
                return self.fail(e.into());
            }
        }
        LoopState::AwaitingModel
    }

    fn await_user(&mut self, input: &mut dyn InputSource) -> LoopState {
        loop {
            let line = match input.read_line(USER_PROMPT) {
                Ok(Some(line)) => line,
                Ok(None) => return LoopState::Terminated(Termination::EndOfInput),
                Err(e) => return self.fail(e),
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if is_exit_command(line) {
                return LoopState::Terminated(Termination::UserExit);
            }
            return match self.history.push_user(line) {
                Ok(()) => LoopState::AwaitingModel,
                Err(e) => self.fail(e.into()),
            };
        }
    }

    fn fail(&mut self, err: AgentError) -> LoopState {
        warn!(error = %err, "session terminated");
        let _ = writeln!(self.out, "Error during interaction loop: {err}");
        LoopState::Terminated(Termination::Failed(err))
    }
}

/// Returns `true` for `exit`/`quit` in any case.
#[must_use]
pub fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS
        .iter()
        .any(|cmd| line.trim().eq_ignore_ascii_case(cmd))
}

/// Shortens `text` to `limit` characters for the transcript.
#[must_use]
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Reads the configuration listings for the instruction turn.
///
/// A listing that cannot be read is logged and left out; the model can
/// still discover ids through tool errors.
pub async fn prefetch_context(backend: &dyn ToolBackend) -> Vec<ContextListing> {
    let mut listings = Vec::with_capacity(CONTEXT_RESOURCES.len());
    for uri in CONTEXT_RESOURCES {
        match backend.read(uri).await {
            Ok(content) => listings.push(ContextListing {
                uri: uri.to_string(),
                content,
            }),
            Err(e) => warn!(uri, error = %e, "skipping context listing"),
        }
    }
    listings
}
