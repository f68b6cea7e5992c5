//! The message-send turn.

use std::sync::Arc;

use tracing::{info, instrument};

use super::error::{ChatError, StoreError};
use super::models::{Chat, ChatMessage, DEFAULT_CHAT_TITLE, MessageRole, next_title};
use super::repository::ChatRepository;
use crate::genai::{HISTORY_WINDOW, HistoryTurn, InteractionAdapter, TurnRequest};

/// Stored result of a successful turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// The model's reply.
    pub message: ChatMessage,
    /// The chat after its metadata was updated.
    pub chat: Chat,
}

/// Runs conversational turns and persists their results.
#[derive(Debug, Clone)]
pub struct ChatService {
    repo: ChatRepository,
    adapter: Arc<InteractionAdapter>,
}

impl ChatService {
    pub fn new(repo: ChatRepository, adapter: Arc<InteractionAdapter>) -> Self {
        Self { repo, adapter }
    }

    pub fn repository(&self) -> &ChatRepository {
        &self.repo
    }

    /// Send `content` to `model_name` within a chat.
    ///
    /// The user message is stored before the model is called and stays in
    /// history if the call fails. Chat metadata only changes on success.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        content: &str,
        model_name: &str,
    ) -> Result<TurnResult, ChatError> {
        let content = content.trim();
        let model_name = model_name.trim();
        if content.is_empty() {
            return Err(ChatError::Validation(
                "Message content is required.".to_string(),
            ));
        }
        if model_name.is_empty() {
            return Err(ChatError::Validation(
                "Model name is required.".to_string(),
            ));
        }

        let chat = self
            .repo
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Chat".to_string()))?;

        let user_message = self
            .repo
            .add_message(chat_id, MessageRole::User, content)
            .await?;

        let history: Vec<HistoryTurn> = self
            .repo
            .recent_messages(chat_id, user_message.id, HISTORY_WINDOW as i64)
            .await?
            .iter()
            .map(HistoryTurn::from)
            .collect();

        let outcome = self
            .adapter
            .run_turn(TurnRequest {
                model: model_name,
                content,
                previous: &chat.interaction_id,
                history: &history,
            })
            .await?;

        // The stored title may have been renamed while the model was working.
        let auto_title = next_title(DEFAULT_CHAT_TITLE, content);
        let (message, chat) = self
            .repo
            .complete_turn(chat_id, &outcome.reply, &auto_title, &outcome.interaction, model_name)
            .await?;

        info!(
            chat_id,
            model = model_name,
            strategy = %outcome.strategy,
            resumable = !chat.interaction_id.is_none(),
            "chat turn stored"
        );
        Ok(TurnResult { message, chat })
    }
}
