//! Chatbox
//!
//! A personal chat service: conversations are stored in SQLite and each
//! message is forwarded to a hosted Gemini model, resuming model-side state
//! where possible.

pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod genai;
