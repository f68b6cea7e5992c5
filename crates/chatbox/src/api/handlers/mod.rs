//! API request handlers.

mod chats;
mod messages;
mod misc;
mod models;

pub use chats::*;
pub use messages::*;
pub use misc::*;
pub use models::*;

use serde::Serialize;

/// Response for delete endpoints.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

impl DeletedResponse {
    fn ok() -> Self {
        Self { deleted: true }
    }
}
