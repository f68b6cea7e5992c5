//! Wire types for the Gemini REST API.

use serde::{Deserialize, Serialize};

/// Body of `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Single user turn carrying `prompt`.
    pub fn user_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Body of `POST /interactions`. Exactly one of `model` and `agent` is set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateInteractionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_interaction_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub background: bool,
}

impl CreateInteractionRequest {
    pub fn for_model(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            input: input.into(),
            ..Default::default()
        }
    }

    /// Background job for a long-running agent.
    pub fn for_agent(agent: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            agent: Some(agent.into()),
            input: input.into(),
            background: true,
            ..Default::default()
        }
    }

    pub fn previous_interaction_id(mut self, id: Option<&str>) -> Self {
        self.previous_interaction_id = id.map(str::to_string);
        self
    }
}

/// Lifecycle state of an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    InProgress,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    pub id: Option<String>,
    /// Synchronous calls may omit the status; they are complete on return.
    #[serde(default)]
    pub status: Option<InteractionStatus>,
    #[serde(default)]
    pub outputs: Vec<InteractionContent>,
}

impl Interaction {
    /// Text of the last text output. Thought summaries and other output
    /// types are skipped.
    pub fn text(&self) -> String {
        self.outputs
            .iter()
            .rev()
            .filter(|output| output.is_text())
            .find_map(|output| output.text.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionContent {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl InteractionContent {
    /// Untyped outputs are treated as text.
    pub fn is_text(&self) -> bool {
        self.kind.as_deref().is_none_or(|kind| kind == "text")
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_content_text_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response.text(), "Hello, world");

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn test_agent_request_serialization() {
        let body = serde_json::to_value(
            CreateInteractionRequest::for_agent("deep-research-pro-preview-12-2025", "hi")
                .previous_interaction_id(Some("int-1")),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "agent": "deep-research-pro-preview-12-2025",
                "input": "hi",
                "previous_interaction_id": "int-1",
                "background": true
            })
        );

        let body = serde_json::to_value(CreateInteractionRequest::for_model("m", "hi")).unwrap();
        assert_eq!(body, json!({"model": "m", "input": "hi"}));
    }

    #[test]
    fn test_interaction_status_and_text() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "int-9",
            "status": "completed",
            "outputs": [
                {"type": "text", "text": "final answer"},
                {"type": "thought", "summary": "thinking", "text": "scratch notes"}
            ]
        }))
        .unwrap();
        assert_eq!(interaction.status, Some(InteractionStatus::Completed));
        assert_eq!(interaction.text(), "final answer");

        let untyped: Interaction =
            serde_json::from_value(json!({"outputs": [{"text": "plain"}]})).unwrap();
        assert_eq!(untyped.text(), "plain");

        let odd: Interaction = serde_json::from_value(json!({"status": "paused"})).unwrap();
        assert_eq!(odd.status, Some(InteractionStatus::Unknown));
        assert!(InteractionStatus::Cancelled.is_failure());
        assert!(!InteractionStatus::InProgress.is_failure());
    }
}
