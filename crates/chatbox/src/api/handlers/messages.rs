//! Message-send handler.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::chat::{Chat, ChatMessage};

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// The stored model reply.
    pub message: ChatMessage,
    pub chat: Chat,
}

/// Run one conversational turn in a chat.
#[instrument(skip(state, request), fields(model = ?request.model_name))]
pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let turn = state
        .chats
        .send_message(
            chat_id,
            request.content.as_deref().unwrap_or_default(),
            request.model_name.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(SendMessageResponse {
        message: turn.message,
        chat: turn.chat,
    }))
}
