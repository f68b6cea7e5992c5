//! Model catalog handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::DeletedResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chat::Model;

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub models: Vec<Model>,
}

#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub model: Model,
}

/// Body of create and rename requests.
#[derive(Debug, Default, Deserialize)]
pub struct ModelNameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

impl ModelNameRequest {
    fn validated_name(&self) -> ApiResult<&str> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ApiError::bad_request("Model name is required.")),
        }
    }
}

/// List models in creation order.
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<ModelListResponse>> {
    let models = state.repo.list_models().await?;
    Ok(Json(ModelListResponse { models }))
}

/// Add a model.
#[instrument(skip(state, request))]
pub async fn create_model(
    State(state): State<AppState>,
    Json(request): Json<ModelNameRequest>,
) -> ApiResult<Json<ModelResponse>> {
    let name = request.validated_name()?;
    let model = state.repo.create_model(name).await?;
    info!(model_id = model.id, name = %model.name, "Created model");
    Ok(Json(ModelResponse { model }))
}

/// Rename a model.
#[instrument(skip(state, request))]
pub async fn update_model(
    State(state): State<AppState>,
    Path(model_id): Path<i64>,
    Json(request): Json<ModelNameRequest>,
) -> ApiResult<Json<ModelResponse>> {
    let name = request.validated_name()?;
    let model = state.repo.rename_model(model_id, name).await?;
    info!(model_id, name = %model.name, "Renamed model");
    Ok(Json(ModelResponse { model }))
}

/// Delete a model. Chats keep the name they last used.
#[instrument(skip(state))]
pub async fn delete_model(
    State(state): State<AppState>,
    Path(model_id): Path<i64>,
) -> ApiResult<Json<DeletedResponse>> {
    state.repo.delete_model(model_id).await?;
    info!(model_id, "Deleted model");
    Ok(Json(DeletedResponse::ok()))
}
