//! Gemini REST client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, trace};

use super::backend::{GenAiBackend, InteractionOutput, SessionId, SessionReply};
use super::error::{GenAiError, GenAiResult};
use super::types::*;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked for an API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Prefix of session handles that have not completed a turn yet.
const LOCAL_SESSION_PREFIX: &str = "local-";

/// Connection and polling settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub base_url: String,
    /// Explicit key; when `None` the environment is consulted.
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub interactions_enabled: bool,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(10),
            max_poll_attempts: 180,
            interactions_enabled: true,
        }
    }
}

/// Resolve the API key from `explicit`, then the environment.
pub fn resolve_api_key(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(API_KEY_ENV_VARS.iter().filter_map(|var| std::env::var(var).ok()))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// [`GenAiBackend`] over the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    poll_interval: Duration,
    max_poll_attempts: u32,
    interactions_enabled: bool,
}

impl GeminiClient {
    /// Create a new client. The API key is resolved once, here.
    pub fn new(options: GeminiOptions) -> GenAiResult<Self> {
        let client = Client::builder().timeout(options.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            api_key: resolve_api_key(options.api_key.as_deref()),
            poll_interval: options.poll_interval,
            max_poll_attempts: options.max_poll_attempts,
            interactions_enabled: options.interactions_enabled,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn authorized(&self, request: RequestBuilder) -> GenAiResult<RequestBuilder> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(GenAiError::MissingCredentials)?;
        Ok(request.header(API_KEY_HEADER, key))
    }

    async fn post_interaction(
        &self,
        request: &CreateInteractionRequest,
    ) -> GenAiResult<Interaction> {
        let url = format!("{}/interactions", self.base_url);
        let response = self
            .authorized(self.client.post(&url))?
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the current state of an interaction.
    pub async fn get_interaction(&self, id: &str) -> GenAiResult<Interaction> {
        let url = format!("{}/interactions/{}", self.base_url, id);
        let response = self.authorized(self.client.get(&url))?.send().await?;

        self.handle_response(response).await
    }

    /// Poll a background interaction until it reaches a terminal state.
    async fn wait_for_interaction(&self, started: Interaction) -> GenAiResult<Interaction> {
        let id = started
            .id
            .clone()
            .ok_or_else(|| GenAiError::Parse("interaction response has no id".to_string()))?;

        let mut current = started;
        let mut attempts = 0;
        loop {
            match current.status {
                Some(InteractionStatus::Completed) => return Ok(current),
                Some(ref status) if status.is_failure() => {
                    return Err(GenAiError::JobFailed {
                        id,
                        status: status.as_str().to_string(),
                    });
                }
                _ => {}
            }

            if attempts >= self.max_poll_attempts {
                return Err(GenAiError::Timeout { attempts });
            }
            attempts += 1;

            tokio::time::sleep(self.poll_interval).await;
            current = self.get_interaction(&id).await?;
            trace!(interaction_id = %id, attempts, status = ?current.status, "polled interaction");
        }
    }

    /// Handle response and parse JSON or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> GenAiResult<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| GenAiError::Parse(format!("Failed to parse response: {}", e)))
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .map(|envelope| envelope.error.message)
                .filter(|message| !message.is_empty())
                .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

            Err(GenAiError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl GenAiBackend for GeminiClient {
    fn ensure_credentials(&self) -> GenAiResult<()> {
        if self.api_key.is_some() {
            Ok(())
        } else {
            Err(GenAiError::MissingCredentials)
        }
    }

    fn supports_interactions(&self) -> bool {
        self.interactions_enabled
    }

    async fn create_session(&self, agent: &str) -> GenAiResult<SessionId> {
        let session = SessionId::new(format!("{LOCAL_SESSION_PREFIX}{}", uuid::Uuid::new_v4()));
        debug!(agent, session = %session, "opened agent session");
        Ok(session)
    }

    async fn send_message(
        &self,
        agent: &str,
        session: &SessionId,
        message: &str,
    ) -> GenAiResult<SessionReply> {
        let previous = Some(session.as_str()).filter(|id| !id.starts_with(LOCAL_SESSION_PREFIX));
        let request =
            CreateInteractionRequest::for_agent(agent, message).previous_interaction_id(previous);

        let started = self.post_interaction(&request).await?;
        let job_id = started
            .id
            .clone()
            .ok_or_else(|| GenAiError::Parse("interaction response has no id".to_string()))?;
        debug!(agent, interaction_id = %job_id, "started agent job");

        let finished = self.wait_for_interaction(started).await?;
        // The next turn continues from the job, never from a local handle.
        let next = SessionId::new(finished.id.clone().unwrap_or(job_id));

        Ok(SessionReply {
            text: finished.text(),
            session: next,
        })
    }

    async fn create_interaction(
        &self,
        model: &str,
        input: &str,
        previous_interaction_id: Option<&str>,
    ) -> GenAiResult<InteractionOutput> {
        let request = CreateInteractionRequest::for_model(model, input)
            .previous_interaction_id(previous_interaction_id);
        let interaction = self.post_interaction(&request).await?;

        Ok(InteractionOutput {
            text: interaction.text(),
            id: interaction.id,
        })
    }

    async fn generate_content(&self, model: &str, prompt: &str) -> GenAiResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .authorized(self.client.post(&url))?
            .json(&GenerateContentRequest::user_prompt(prompt))
            .send()
            .await?;

        let body: GenerateContentResponse = self.handle_response(response).await?;
        Ok(body.text())
    }
}
