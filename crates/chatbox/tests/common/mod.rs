//! Test utilities and common setup.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chatbox::api::{self, AppState};
use chatbox::chat::ChatRepository;
use chatbox::db::Database;
use chatbox::genai::{
    GenAiBackend, GenAiError, GenAiResult, InteractionOutput, SessionId, SessionReply,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const AGENT_MODEL: &str = "deep-research-pro-preview-12-2025";
pub const STANDARD_MODEL: &str = "gemini-3-flash-preview";

/// A call made against [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    CreateSession { agent: String },
    Send { session: String, message: String },
    Interaction { input: String, previous: Option<String> },
    Generate { prompt: String },
}

/// Scripted model backend.
///
/// Every reply-producing call pops the next scripted outcome; once the
/// script is exhausted calls succeed with `"reply #n"`.
pub struct FakeBackend {
    credentials: bool,
    interactions: bool,
    script: Mutex<VecDeque<GenAiResult<String>>>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            credentials: true,
            interactions: true,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    pub fn without_interactions(mut self) -> Self {
        self.interactions = false;
        self
    }

    pub fn then_reply(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn then_fail(self, err: GenAiError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_outcome(&self) -> GenAiResult<String> {
        let replies = self.calls().len();
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply #{replies}")))
    }
}

#[async_trait]
impl GenAiBackend for FakeBackend {
    fn ensure_credentials(&self) -> GenAiResult<()> {
        if self.credentials {
            Ok(())
        } else {
            Err(GenAiError::MissingCredentials)
        }
    }

    fn supports_interactions(&self) -> bool {
        self.interactions
    }

    async fn create_session(&self, agent: &str) -> GenAiResult<SessionId> {
        self.record(FakeCall::CreateSession {
            agent: agent.to_string(),
        });
        let created = self
            .calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::CreateSession { .. }))
            .count();
        Ok(SessionId::new(format!("fake-session-{created}")))
    }

    async fn send_message(
        &self,
        _agent: &str,
        session: &SessionId,
        message: &str,
    ) -> GenAiResult<SessionReply> {
        self.record(FakeCall::Send {
            session: session.to_string(),
            message: message.to_string(),
        });
        Ok(SessionReply {
            text: self.next_outcome()?,
            session: session.clone(),
        })
    }

    async fn create_interaction(
        &self,
        _model: &str,
        input: &str,
        previous_interaction_id: Option<&str>,
    ) -> GenAiResult<InteractionOutput> {
        self.record(FakeCall::Interaction {
            input: input.to_string(),
            previous: previous_interaction_id.map(str::to_string),
        });
        let count = self.calls().len();
        Ok(InteractionOutput {
            text: self.next_outcome()?,
            id: Some(format!("fake-interaction-{count}")),
        })
    }

    async fn generate_content(&self, _model: &str, prompt: &str) -> GenAiResult<String> {
        self.record(FakeCall::Generate {
            prompt: prompt.to_string(),
        });
        self.next_outcome()
    }
}

/// Router over an in-memory database and a [`FakeBackend`].
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub backend: Arc<FakeBackend>,
    _static_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_backend(FakeBackend::new()).await
    }

    pub async fn with_backend(backend: FakeBackend) -> Self {
        let db = Database::in_memory().await.unwrap();
        let backend = Arc::new(backend);

        let static_dir = TempDir::new().unwrap();
        std::fs::write(
            static_dir.path().join("index.html"),
            "<!doctype html><title>Chatbox</title>",
        )
        .unwrap();
        std::fs::write(static_dir.path().join("app.js"), "console.log('chatbox');").unwrap();

        let repo = ChatRepository::new(db.pool().clone());
        let state = AppState::new(repo, backend.clone(), static_dir.path());
        let router = api::create_router(state);

        Self {
            router,
            db,
            backend,
            _static_dir: static_dir,
        }
    }

    pub fn repo(&self) -> ChatRepository {
        ChatRepository::new(self.db.pool().clone())
    }

    /// Send a request and decode the JSON response.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw_request(method, uri, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn raw_request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().uri(uri).method(method);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a chat through the API and return its id.
    pub async fn create_chat(&self, body: Value) -> i64 {
        let (status, json) = self.post("/api/chats", body).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json["chat"]["id"].as_i64().unwrap()
    }

    pub async fn send(&self, chat_id: i64, content: &str, model: &str) -> (StatusCode, Value) {
        self.post(
            &format!("/api/chats/{chat_id}/messages"),
            serde_json::json!({"content": content, "model_name": model}),
        )
        .await
    }
}
