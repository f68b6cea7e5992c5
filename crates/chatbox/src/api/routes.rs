//! API route definitions.

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Tracing layer with request timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let static_dir = state.static_dir.as_ref().clone();
    let index = ServeFile::new(static_dir.join("index.html"));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Model catalog
        .route(
            "/models",
            get(handlers::list_models).post(handlers::create_model),
        )
        .route(
            "/models/{model_id}",
            put(handlers::update_model).delete(handlers::delete_model),
        )
        // Chats
        .route(
            "/chats",
            get(handlers::list_chats).post(handlers::create_chat),
        )
        .route("/chats/archived/list", get(handlers::list_archived_chats))
        .route(
            "/chats/{chat_id}",
            get(handlers::get_chat).delete(handlers::delete_chat),
        )
        .route("/chats/{chat_id}/title", put(handlers::rename_chat))
        .route("/chats/{chat_id}/archive", put(handlers::archive_chat))
        .route("/chats/{chat_id}/restore", put(handlers::restore_chat))
        .route("/chats/{chat_id}/messages", post(handlers::send_message))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(static_dir))
        .route_service("/", index)
        .layer(trace_layer)
}
