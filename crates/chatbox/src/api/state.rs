//! Application state shared across handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::chat::{ChatRepository, ChatService};
use crate::genai::{GenAiBackend, InteractionAdapter};

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Direct storage access for CRUD endpoints.
    pub repo: ChatRepository,
    /// Message-send turns.
    pub chats: ChatService,
    /// Directory holding the front-end (`index.html` and assets).
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    /// Wire the repository and model backend together.
    pub fn new(
        repo: ChatRepository,
        backend: Arc<dyn GenAiBackend>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        let adapter = Arc::new(InteractionAdapter::new(backend));
        Self {
            chats: ChatService::new(repo.clone(), adapter),
            repo,
            static_dir: Arc::new(static_dir.into()),
        }
    }
}
