//! Chat data models.

use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use std::fmt;

/// Title given to chats until their first reply arrives.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Maximum length of a user-supplied chat title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Length of the title derived from the first user message, in characters.
pub const AUTO_TITLE_CHARS: usize = 60;

/// A selectable backend model or agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// Resumable model-side conversation state for a chat.
///
/// Persisted as a plain string: empty for [`InteractionRef::None`], the
/// session or interaction id otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionRef {
    /// No resumable state; the next turn starts fresh.
    #[default]
    None,
    /// Session or interaction id returned by the hosted model API.
    Session(String),
}

impl InteractionRef {
    /// Build a reference from an optional id, treating blank ids as none.
    pub fn from_id(id: Option<String>) -> Self {
        match id {
            Some(id) if !id.trim().is_empty() => Self::Session(id),
            _ => Self::None,
        }
    }

    pub fn as_session(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Session(id) => Some(id),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Storage form of the reference.
    pub fn as_str(&self) -> &str {
        self.as_session().unwrap_or("")
    }
}

impl From<String> for InteractionRef {
    fn from(value: String) -> Self {
        Self::from_id(Some(value))
    }
}

impl fmt::Display for InteractionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InteractionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub interaction_id: InteractionRef,
    pub last_model: Option<String>,
    pub archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Which chats a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFilter {
    Active,
    Archived,
    All,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Model,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "model" => Ok(Self::Model),
            _ => Err(format!("Unknown message role: {}", s)),
        }
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A chat message stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_id: i64,
    #[sqlx(try_from = "String")]
    pub role: MessageRole,
    pub content: String,
    pub created_at: String,
}

/// Title a chat should carry after a successful turn.
///
/// Chats still titled [`DEFAULT_CHAT_TITLE`] take the first
/// [`AUTO_TITLE_CHARS`] characters of the user's message, trimmed.
pub fn next_title(current: &str, user_message: &str) -> String {
    if current != DEFAULT_CHAT_TITLE {
        return current.to_string();
    }
    let prefix: String = user_message.chars().take(AUTO_TITLE_CHARS).collect();
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        DEFAULT_CHAT_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}
