//! The client contract for the hosted model API.

use async_trait::async_trait;
use std::fmt;

use super::error::GenAiResult;

/// Handle of an agent session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reply to a message sent within an agent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReply {
    pub text: String,
    /// Session handle to resume from on the next turn.
    pub session: SessionId,
}

/// Result of a stateful interaction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOutput {
    /// Interaction id to continue from, when the API returned one.
    pub id: Option<String>,
    pub text: String,
}

/// Operations the hosted model API offers.
///
/// Implementations report failures as-is; retry and fallback decisions
/// belong to [`super::InteractionAdapter`].
#[async_trait]
pub trait GenAiBackend: Send + Sync {
    /// Fail with `MissingCredentials` when no API key is available.
    fn ensure_credentials(&self) -> GenAiResult<()>;

    /// Whether stateful interactions are offered at all.
    fn supports_interactions(&self) -> bool;

    /// Open a new session for an agent.
    async fn create_session(&self, agent: &str) -> GenAiResult<SessionId>;

    /// Send a message within a session and wait for the agent's reply.
    async fn send_message(
        &self,
        agent: &str,
        session: &SessionId,
        message: &str,
    ) -> GenAiResult<SessionReply>;

    /// Run one stateful interaction, optionally continuing a previous one.
    async fn create_interaction(
        &self,
        model: &str,
        input: &str,
        previous_interaction_id: Option<&str>,
    ) -> GenAiResult<InteractionOutput>;

    /// Single-turn stateless generation.
    async fn generate_content(&self, model: &str, prompt: &str) -> GenAiResult<String>;
}
