//! Append-only conversation history.
//!
//! Turns are a tagged enum so the session can match on them exhaustively.
//! The history enforces call/result pairing on every append: once a model
//! turn requests calls, the only accepted turns are results answering those
//! calls, in the order they were requested. Nothing is ever removed or
//! rewritten, so each model request resends exactly what was appended.

use serde::{Deserialize, Serialize};

use super::message::{
    ChatMessage, assistant_message, system_message, tool_message, user_message,
};
use super::tool::{ToolCall, ToolResult};
use crate::error::HistoryError;

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// Session instruction naming the document and configuration context.
    Instruction {
        /// Instruction text.
        text: String,
    },
    /// Text typed by the user.
    UserText {
        /// User text.
        text: String,
    },
    /// Final text produced by the model.
    ModelText {
        /// Model text.
        text: String,
    },
    /// Function calls requested by the model in one response.
    ToolCallBatch {
        /// Text the model sent alongside the calls (often empty).
        text: String,
        /// Calls in the order the model returned them.
        calls: Vec<ToolCall>,
    },
    /// Result of one dispatched call.
    ToolResult {
        /// The result.
        result: ToolResult,
    },
}

impl Turn {
    /// Renders the turn as a provider message.
    #[must_use]
    pub fn to_message(&self) -> ChatMessage {
        match self {
            Self::Instruction { text } => system_message(text),
            Self::UserText { text } => user_message(text),
            Self::ModelText { text } => assistant_message(text, Vec::new()),
            Self::ToolCallBatch { text, calls } => assistant_message(text, calls.clone()),
            Self::ToolResult { result } => tool_message(&result.tool_call_id, &result.content),
        }
    }
}

/// Ordered, append-only sequence of [`Turn`]s for one session.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    /// Calls from the latest batch that have no result yet, in order.
    pending: Vec<ToolCall>,
}

impl ConversationHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the session instruction.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::CallsPending`] if calls await results.
    pub fn push_instruction(&mut self, text: impl Into<String>) -> Result<(), HistoryError> {
        self.push_text(Turn::Instruction { text: text.into() })
    }

    /// Appends a user turn.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::CallsPending`] if calls await results.
    pub fn push_user(&mut self, text: impl Into<String>) -> Result<(), HistoryError> {
        self.push_text(Turn::UserText { text: text.into() })
    }

    /// Appends the model's final text for a turn.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::CallsPending`] if calls await results.
    pub fn push_model_text(&mut self, text: impl Into<String>) -> Result<(), HistoryError> {
        self.push_text(Turn::ModelText { text: text.into() })
    }

    /// Appends a batch of calls. Every call in it becomes pending.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::EmptyBatch`] for an empty batch, or
    /// [`HistoryError::CallsPending`] if a previous batch is unanswered.
    pub fn push_call_batch(
        &mut self,
        text: impl Into<String>,
        calls: Vec<ToolCall>,
    ) -> Result<(), HistoryError> {
        if calls.is_empty() {
            return Err(HistoryError::EmptyBatch);
        }
        self.ensure_balanced()?;
        self.pending.clone_from(&calls);
        self.turns.push(Turn::ToolCallBatch {
            text: text.into(),
            calls,
        });
        Ok(())
    }

    /// Appends the result for the next pending call.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnexpectedResult`] if nothing is pending or
    /// the result answers a different call.
    pub fn push_result(&mut self, result: ToolResult) -> Result<(), HistoryError> {
        let answers_next = self
            .pending
            .first()
            .is_some_and(|call| call.id == result.tool_call_id);
        if !answers_next {
            return Err(HistoryError::UnexpectedResult {
                tool_call_id: result.tool_call_id,
            });
        }
        self.pending.remove(0);
        self.turns.push(Turn::ToolResult { result });
        Ok(())
    }

    /// Calls from the latest batch still awaiting results, in order.
    #[must_use]
    pub fn pending_calls(&self) -> &[ToolCall] {
        &self.pending
    }

    /// Returns `true` when every recorded call has its result.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.pending.is_empty()
    }

    /// All turns in order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if no turn has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Total number of calls across all batches.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.turns
            .iter()
            .map(|turn| match turn {
                Turn::ToolCallBatch { calls, .. } => calls.len(),
                _ => 0,
            })
            .sum()
    }

    /// Number of result turns.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|turn| matches!(turn, Turn::ToolResult { .. }))
            .count()
    }

    /// Renders the history as provider messages for the next model call.
    #[must_use]
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().map(Turn::to_message).collect()
    }

    fn push_text(&mut self, turn: Turn) -> Result<(), HistoryError> {
        self.ensure_balanced()?;
        self.turns.push(turn);
        Ok(())
    }

    fn ensure_balanced(&self) -> Result<(), HistoryError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(HistoryError::CallsPending {
                pending: self.pending.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::Role;
    use proptest::prelude::*;

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: "{}".to_string(),
        }
    }

    fn result(id: &str, name: &str) -> ToolResult {
        ToolResult {
            tool_call_id: id.to_string(),
            tool_name: name.to_string(),
            content: format!("{name} output"),
            is_error: false,
        }
    }

    #[test]
    fn test_batch_then_results_in_order() {
        let mut history = ConversationHistory::new();
        history.push_instruction("instr").unwrap();
        history.push_user("assess").unwrap();
        history
            .push_call_batch(
                "",
                vec![call("a", "extract_document"), call("b", "identify_risks")],
            )
            .unwrap();
        assert_eq!(history.pending_calls().len(), 2);

        history.push_result(result("a", "extract_document")).unwrap();
        assert_eq!(history.pending_calls().len(), 1);
        history.push_result(result("b", "identify_risks")).unwrap();
        assert!(history.is_balanced());
        assert_eq!(history.call_count(), 2);
        assert_eq!(history.result_count(), 2);
    }

    #[test]
    fn test_out_of_order_result_rejected() {
        let mut history = ConversationHistory::new();
        history
            .push_call_batch("", vec![call("a", "x"), call("b", "y")])
            .unwrap();
        let err = history.push_result(result("b", "y")).unwrap_err();
        assert_eq!(
            err,
            HistoryError::UnexpectedResult {
                tool_call_id: "b".to_string()
            }
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_result_without_call_rejected() {
        let mut history = ConversationHistory::new();
        assert!(history.push_result(result("a", "x")).is_err());
        assert!(history.is_empty());
    }

    #[test]
    fn test_text_blocked_while_calls_pending() {
        let mut history = ConversationHistory::new();
        history.push_call_batch("", vec![call("a", "x")]).unwrap();
        assert_eq!(
            history.push_user("hello"),
            Err(HistoryError::CallsPending { pending: 1 })
        );
        assert!(history.push_model_text("done").is_err());
        assert!(history.push_call_batch("", vec![call("b", "y")]).is_err());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let mut history = ConversationHistory::new();
        assert_eq!(
            history.push_call_batch("", Vec::new()),
            Err(HistoryError::EmptyBatch)
        );
    }

    #[test]
    fn test_to_messages_roles() {
        let mut history = ConversationHistory::new();
        history.push_instruction("instr").unwrap();
        history.push_user("go").unwrap();
        history.push_call_batch("", vec![call("a", "x")]).unwrap();
        history.push_result(result("a", "x")).unwrap();
        history.push_model_text("done").unwrap();

        let roles: Vec<Role> = history.to_messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant
            ]
        );
        let messages = history.to_messages();
        assert_eq!(messages[2].tool_calls.len(), 1);
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_turn_serialization_is_tagged() {
        let turn = Turn::UserText {
            text: "hi".to_string(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains(r#""kind":"user_text""#));
    }

    proptest! {
        #[test]
        fn prop_results_match_calls_after_each_batch(batches in prop::collection::vec(0usize..5, 1..12)) {
            let mut history = ConversationHistory::new();
            history.push_instruction("instr").unwrap();
            let mut next_id = 0usize;

            for size in batches {
                history.push_user("request").unwrap();
                if size == 0 {
                    history.push_model_text("answer").unwrap();
                    continue;
                }
                let calls: Vec<ToolCall> = (0..size)
                    .map(|_| {
                        next_id += 1;
                        call(&format!("call_{next_id}"), "extract_document")
                    })
                    .collect();
                history.push_call_batch("", calls.clone()).unwrap();
                prop_assert_eq!(history.pending_calls().len(), size);

                for c in &calls {
                    history.push_result(result(&c.id, &c.name)).unwrap();
                }
                prop_assert!(history.is_balanced());
                prop_assert_eq!(history.call_count(), history.result_count());
            }
        }

        #[test]
        fn prop_rejected_append_leaves_history_unchanged(id in "[a-z]{1,8}") {
            let mut history = ConversationHistory::new();
            history.push_call_batch("", vec![call("expected", "x")]).unwrap();
            let before = history.len();
            if id != "expected" {
                prop_assert!(history.push_result(result(&id, "x")).is_err());
            }
            prop_assert!(history.push_user("early").is_err());
            prop_assert_eq!(history.len(), before);
        }
    }
}
