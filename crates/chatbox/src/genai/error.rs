//! Hosted model client error types.

use thiserror::Error;

/// Result type for model client operations.
pub type GenAiResult<T> = Result<T, GenAiError>;

/// Errors that can occur while running a conversational turn.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// No API key configured.
    #[error("Missing GEMINI_API_KEY (or GOOGLE_API_KEY) environment variable.")]
    MissingCredentials,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("model API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A long-running job ended in a terminal failure state.
    #[error("model job {id} ended with status {status}")]
    JobFailed { id: String, status: String },

    /// A long-running job did not finish within the polling budget.
    #[error("model job did not finish after {attempts} polls")]
    Timeout { attempts: u32 },

    /// The model produced no text.
    #[error("Gemini returned an empty response.")]
    EmptyResponse,
}

impl GenAiError {
    /// Terminal errors end the fallback chain instead of advancing it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::JobFailed { .. } | Self::Timeout { .. }
        )
    }
}
