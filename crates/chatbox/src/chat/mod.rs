//! Chats, their messages and the models they talk to.

mod error;
mod models;
mod repository;
mod service;

pub use error::{ChatError, StoreError, StoreResult};
pub use models::{
    AUTO_TITLE_CHARS, Chat, ChatFilter, ChatMessage, DEFAULT_CHAT_TITLE, InteractionRef,
    MAX_TITLE_CHARS, MessageRole, Model, next_title,
};
pub use repository::ChatRepository;
pub use service::{ChatService, TurnResult};
