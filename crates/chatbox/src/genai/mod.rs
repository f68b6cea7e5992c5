//! Hosted model client and conversational turn orchestration.
//!
//! [`GenAiBackend`] is the client contract; [`GeminiClient`] implements it over
//! REST. [`InteractionAdapter`] decides per turn whether model-side state is
//! resumed and falls back to stateless generation when it cannot be.

mod adapter;
mod backend;
mod client;
mod error;
mod prompt;
mod types;

pub use adapter::{InteractionAdapter, Strategy, TurnOutcome, TurnRequest};
pub use backend::{GenAiBackend, InteractionOutput, SessionId, SessionReply};
pub use client::{API_KEY_ENV_VARS, DEFAULT_BASE_URL, GeminiClient, GeminiOptions, resolve_api_key};
pub use error::{GenAiError, GenAiResult};
pub use prompt::{HISTORY_WINDOW, HistoryTurn, ModelKind, build_transcript, classify_model};
pub use types::*;
