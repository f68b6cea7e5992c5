//! HTTP API module.
//!
//! JSON endpoints for models, chats and messages under `/api`, plus the
//! static front-end.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
