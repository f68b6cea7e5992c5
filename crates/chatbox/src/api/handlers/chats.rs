//! Chat handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::DeletedResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chat::{Chat, ChatFilter, ChatMessage, DEFAULT_CHAT_TITLE, MAX_TITLE_CHARS};

#[derive(Debug, Serialize)]
pub struct ChatListResponse {
    pub chats: Vec<Chat>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub chat: Chat,
}

#[derive(Debug, Serialize)]
pub struct ChatDetailResponse {
    pub chat: Chat,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub chat: Chat,
    pub archived: bool,
}

/// Body of `POST /api/chats`; the whole body is optional.
#[derive(Debug, Default, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameChatRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// List active chats, most recently updated first.
pub async fn list_chats(State(state): State<AppState>) -> ApiResult<Json<ChatListResponse>> {
    let chats = state.repo.list_chats(ChatFilter::Active).await?;
    Ok(Json(ChatListResponse { chats }))
}

/// List archived chats, most recently updated first.
pub async fn list_archived_chats(
    State(state): State<AppState>,
) -> ApiResult<Json<ChatListResponse>> {
    let chats = state.repo.list_chats(ChatFilter::Archived).await?;
    Ok(Json(ChatListResponse { chats }))
}

/// Create a chat.
#[instrument(skip(state, body))]
pub async fn create_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ChatResponse>> {
    let request = parse_optional_body(&body)?;

    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_CHAT_TITLE);
    let model_name = request
        .model_name
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    let chat = state.repo.create_chat(title, model_name).await?;
    info!(chat_id = chat.id, "Created chat");
    Ok(Json(ChatResponse { chat }))
}

fn parse_optional_body(body: &[u8]) -> ApiResult<CreateChatRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateChatRequest::default());
    }
    // `null` is accepted like an empty body.
    serde_json::from_slice::<Option<CreateChatRequest>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
}

/// Get a chat with all of its messages.
pub async fn get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<ChatDetailResponse>> {
    let chat = state
        .repo
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Chat not found"))?;
    let messages = state.repo.list_messages(chat_id).await?;
    Ok(Json(ChatDetailResponse { chat, messages }))
}

/// Rename a chat.
#[instrument(skip(state, request))]
pub async fn rename_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(request): Json<RenameChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let title = request.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required."));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::bad_request(format!(
            "Title too long (max {MAX_TITLE_CHARS} characters)."
        )));
    }

    let chat = state.repo.rename_chat(chat_id, title).await?;
    info!(chat_id, "Renamed chat");
    Ok(Json(ChatResponse { chat }))
}

/// Hide a chat from the main list.
#[instrument(skip(state))]
pub async fn archive_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<ArchiveResponse>> {
    let chat = state.repo.set_archived(chat_id, true).await?;
    info!(chat_id, "Archived chat");
    Ok(Json(ArchiveResponse {
        chat,
        archived: true,
    }))
}

/// Return an archived chat to the main list.
#[instrument(skip(state))]
pub async fn restore_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<ArchiveResponse>> {
    let chat = state.repo.set_archived(chat_id, false).await?;
    info!(chat_id, "Restored chat");
    Ok(Json(ArchiveResponse {
        chat,
        archived: false,
    }))
}

/// Delete a chat and its messages.
#[instrument(skip(state))]
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<DeletedResponse>> {
    state.repo.delete_chat(chat_id).await?;
    info!(chat_id, "Deleted chat");
    Ok(Json(DeletedResponse::ok()))
}
