//! Prompt reconstruction from locally stored history.

use crate::chat::{ChatMessage, MessageRole};

/// Number of prior turns replayed when no model-side state exists.
pub const HISTORY_WINDOW: usize = 20;

/// Name prefix of models backed by long-running agent sessions.
const AGENT_MODEL_PREFIX: &str = "deep-research";

/// How a model is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Session-oriented, long-running agent.
    Agent,
    /// Regular request/response model.
    Standard,
}

/// Classify a model by name.
pub fn classify_model(model_name: &str) -> ModelKind {
    if model_name.starts_with(AGENT_MODEL_PREFIX) {
        ModelKind::Agent
    } else {
        ModelKind::Standard
    }
}

/// One prior turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub text: String,
}

impl HistoryTurn {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    fn label(&self) -> &'static str {
        match self.role {
            MessageRole::User => "User",
            MessageRole::Model => "Assistant",
        }
    }
}

impl From<&ChatMessage> for HistoryTurn {
    fn from(message: &ChatMessage) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// Replay the last [`HISTORY_WINDOW`] turns followed by the new user line.
///
/// Without history the content is returned unchanged.
pub fn build_transcript(history: &[HistoryTurn], content: &str) -> String {
    if history.is_empty() {
        return content.to_string();
    }

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut lines: Vec<String> = history[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.label(), turn.text))
        .collect();
    lines.push(format!("User: {content}"));
    lines.join("\n")
}
