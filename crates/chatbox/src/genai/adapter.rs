//! Conversational turn orchestration.
//!
//! [`InteractionAdapter::run_turn`] hides which API surface produced a reply.
//! Each model kind maps to an ordered plan of [`Strategy`] values; the adapter
//! tries them in order and moves on only when a strategy fails with a
//! non-terminal error:
//!
//! ```text
//! agent models:        AgentSession -> FreshAgentSession -> Stateless
//! standard models:     Interaction  -> Stateless
//! no interaction API:  Stateless
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::{GenAiBackend, SessionId};
use super::error::{GenAiError, GenAiResult};
use super::prompt::{HistoryTurn, ModelKind, build_transcript, classify_model};
use crate::chat::InteractionRef;

const AGENT_PLAN: &[Strategy] = &[
    Strategy::AgentSession,
    Strategy::FreshAgentSession,
    Strategy::Stateless,
];
const INTERACTION_PLAN: &[Strategy] = &[Strategy::Interaction, Strategy::Stateless];
const STATELESS_PLAN: &[Strategy] = &[Strategy::Stateless];

/// One way of obtaining a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Send within the chat's agent session, opening one when the chat has none.
    AgentSession,
    /// Open a brand-new agent session and resend the same message.
    FreshAgentSession,
    /// Stateful interaction, continuing the previous one when present.
    Interaction,
    /// Single-turn generation with history replayed as text.
    Stateless,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentSession => "agent_session",
            Self::FreshAgentSession => "fresh_agent_session",
            Self::Interaction => "interaction",
            Self::Stateless => "stateless",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for one conversational turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    pub model: &'a str,
    pub content: &'a str,
    /// Model-side state left by the previous turn.
    pub previous: &'a InteractionRef,
    /// Prior turns, oldest first.
    pub history: &'a [HistoryTurn],
}

/// Reply produced by a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    /// State to resume from next turn.
    pub interaction: InteractionRef,
    pub strategy: Strategy,
}

/// Runs conversational turns against a [`GenAiBackend`].
#[derive(Clone)]
pub struct InteractionAdapter {
    backend: Arc<dyn GenAiBackend>,
    interactions_available: bool,
}

impl fmt::Debug for InteractionAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionAdapter")
            .field("interactions_available", &self.interactions_available)
            .finish_non_exhaustive()
    }
}

impl InteractionAdapter {
    /// Create an adapter. Interaction support is probed once, here.
    pub fn new(backend: Arc<dyn GenAiBackend>) -> Self {
        let interactions_available = backend.supports_interactions();
        debug!(interactions_available, "model backend capabilities");
        Self {
            backend,
            interactions_available,
        }
    }

    pub fn interactions_available(&self) -> bool {
        self.interactions_available
    }

    /// Strategies tried for `model`, in order.
    pub fn plan(&self, model: &str) -> &'static [Strategy] {
        match classify_model(model) {
            ModelKind::Agent => AGENT_PLAN,
            ModelKind::Standard if self.interactions_available => INTERACTION_PLAN,
            ModelKind::Standard => STATELESS_PLAN,
        }
    }

    /// Produce a reply and the interaction reference to store for next turn.
    pub async fn run_turn(&self, request: TurnRequest<'_>) -> GenAiResult<TurnOutcome> {
        self.backend.ensure_credentials()?;

        // A chat without model-side state gets its local history replayed.
        let prepared = match request.previous {
            InteractionRef::None => build_transcript(request.history, request.content),
            InteractionRef::Session(_) => request.content.to_string(),
        };

        let mut failure = None;
        for &strategy in self.plan(request.model) {
            debug!(model = request.model, %strategy, "attempting model strategy");

            match self.attempt(strategy, &request, &prepared).await {
                Ok((reply, interaction)) => {
                    if reply.trim().is_empty() {
                        return Err(GenAiError::EmptyResponse);
                    }
                    info!(model = request.model, %strategy, "model turn completed");
                    return Ok(TurnOutcome {
                        reply,
                        interaction,
                        strategy,
                    });
                }
                Err(err) if err.is_terminal() => return Err(err),
                Err(err) => {
                    warn!(model = request.model, %strategy, error = %err, "model strategy failed");
                    failure = Some(err);
                }
            }
        }

        // Plans are never empty, so a failure has been recorded.
        Err(failure.unwrap_or(GenAiError::EmptyResponse))
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        request: &TurnRequest<'_>,
        prepared: &str,
    ) -> GenAiResult<(String, InteractionRef)> {
        match strategy {
            Strategy::AgentSession => {
                let session = match request.previous.as_session() {
                    Some(id) => SessionId::new(id),
                    None => self.backend.create_session(request.model).await?,
                };
                self.send_in_session(request.model, &session, prepared).await
            }
            Strategy::FreshAgentSession => {
                let session = self.backend.create_session(request.model).await?;
                self.send_in_session(request.model, &session, prepared).await
            }
            Strategy::Interaction => {
                let output = self
                    .backend
                    .create_interaction(request.model, prepared, request.previous.as_session())
                    .await?;
                Ok((output.text, InteractionRef::from_id(output.id)))
            }
            Strategy::Stateless => {
                let prompt = build_transcript(request.history, request.content);
                let text = self.backend.generate_content(request.model, &prompt).await?;
                Ok((text, InteractionRef::None))
            }
        }
    }

    async fn send_in_session(
        &self,
        agent: &str,
        session: &SessionId,
        message: &str,
    ) -> GenAiResult<(String, InteractionRef)> {
        let reply = self.backend.send_message(agent, session, message).await?;
        Ok((
            reply.text,
            InteractionRef::from_id(Some(reply.session.into_inner())),
        ))
    }
}
