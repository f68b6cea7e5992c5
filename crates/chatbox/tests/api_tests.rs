//! API integration tests.

use axum::http::{Method, StatusCode};
use chatbox::chat::{InteractionRef, MessageRole};
use chatbox::db::DEFAULT_MODELS;
use chatbox::genai::GenAiError;
use serde_json::{Value, json};

mod common;
use common::{AGENT_MODEL, FakeBackend, FakeCall, STANDARD_MODEL, TestApp};

fn names(models: &Value) -> Vec<String> {
    models["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap().to_string())
        .collect()
}

fn chat_ids(chats: &Value) -> Vec<i64> {
    chats["chats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (status, json) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_static_front_end() {
    let app = TestApp::new().await;

    let (status, body) = app.raw_request(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("<title>Chatbox</title>"));

    let (status, body) = app.raw_request(Method::GET, "/static/app.js", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("chatbox"));

    let (status, _) = app.raw_request(Method::GET, "/static/missing.js", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========== Models ==========

#[tokio::test]
async fn test_fresh_database_lists_seeded_models_in_order() {
    let app = TestApp::new().await;
    let (status, json) = app.get("/api/models").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&json), DEFAULT_MODELS);
}

#[tokio::test]
async fn test_create_model_trims_name() {
    let app = TestApp::new().await;
    let (status, json) = app.post("/api/models", json!({"name": "  gemini-2.5-pro "})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model"]["name"], "gemini-2.5-pro");
    assert!(json["model"]["id"].is_i64());
    assert!(json["model"]["created_at"].as_str().unwrap().ends_with('Z'));

    let (_, json) = app.get("/api/models").await;
    assert_eq!(names(&json).last().unwrap(), "gemini-2.5-pro");
}

#[tokio::test]
async fn test_create_model_requires_name() {
    let app = TestApp::new().await;

    let (status, json) = app.post("/api/models", json!({"name": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let (status, _) = app.post("/api/models", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_model_is_rejected_and_table_unchanged() {
    let app = TestApp::new().await;
    let before = app.repo().count_models().await.unwrap();

    let (status, json) = app.post("/api/models", json!({"name": DEFAULT_MODELS[0]})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(app.repo().count_models().await.unwrap(), before);
}

#[tokio::test]
async fn test_rename_model() {
    let app = TestApp::new().await;

    let (status, json) = app.put("/api/models/1", Some(json!({"name": "renamed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model"]["id"], 1);
    assert_eq!(json["model"]["name"], "renamed");

    let (status, json) = app
        .put("/api/models/2", Some(json!({"name": "renamed"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "CONFLICT");

    let (status, _) = app.put("/api/models/2", Some(json!({"name": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app.put("/api/models/999", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_model_leaves_chats_alone() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({"model_name": DEFAULT_MODELS[0]})).await;

    let (status, json) = app.delete("/api/models/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"deleted": true}));

    let (status, _) = app.delete("/api/models/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = app.get(&format!("/api/chats/{chat_id}")).await;
    assert_eq!(json["chat"]["last_model"], DEFAULT_MODELS[0]);
}

// ========== Chats ==========

#[tokio::test]
async fn test_create_chat_without_body() {
    let app = TestApp::new().await;
    let (status, json) = app.request(Method::POST, "/api/chats", None).await;

    assert_eq!(status, StatusCode::OK);
    let chat = &json["chat"];
    assert_eq!(chat["title"], "New Chat");
    assert_eq!(chat["interaction_id"], "");
    assert!(chat["last_model"].is_null());
    assert_eq!(chat["archived"], false);
    assert_eq!(chat["created_at"], chat["updated_at"]);
}

#[tokio::test]
async fn test_create_chat_with_title_and_model() {
    let app = TestApp::new().await;
    let (_, json) = app
        .post(
            "/api/chats",
            json!({"title": "  Trip plans ", "model_name": STANDARD_MODEL}),
        )
        .await;

    assert_eq!(json["chat"]["title"], "Trip plans");
    assert_eq!(json["chat"]["last_model"], STANDARD_MODEL);

    let (_, json) = app.post("/api/chats", json!({"title": "   "})).await;
    assert_eq!(json["chat"]["title"], "New Chat");
}

#[tokio::test]
async fn test_get_chat_and_missing_chat() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({})).await;

    let (status, json) = app.get(&format!("/api/chats/{chat_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chat"]["id"], chat_id);
    assert_eq!(json["messages"], json!([]));

    let (status, json) = app.get("/api/chats/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Chat not found");
}

#[tokio::test]
async fn test_chats_are_listed_newest_first() {
    let app = TestApp::new().await;
    let first = app.create_chat(json!({})).await;
    let second = app.create_chat(json!({})).await;

    let (_, json) = app.get("/api/chats").await;
    assert_eq!(chat_ids(&json), vec![second, first]);
}

#[tokio::test]
async fn test_rename_chat_validation() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({})).await;
    let uri = format!("/api/chats/{chat_id}/title");

    let (status, json) = app.put(&uri, Some(json!({"title": "  Renamed  "}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chat"]["title"], "Renamed");

    let (status, json) = app.put(&uri, Some(json!({"title": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Title is required.");

    let (status, _) = app.put(&uri, Some(json!({"title": "x".repeat(201)}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app.put(&uri, Some(json!({"title": "é".repeat(200)}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chat"]["title"].as_str().unwrap().chars().count(), 200);

    let (status, _) = app
        .put("/api/chats/999/title", Some(json!({"title": "ok"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_archive_then_restore_preserves_chat() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({"title": "Keep me"})).await;
    let (status, _) = app.send(chat_id, "hello", STANDARD_MODEL).await;
    assert_eq!(status, StatusCode::OK);
    let (_, before) = app.get(&format!("/api/chats/{chat_id}")).await;

    let (status, json) = app.put(&format!("/api/chats/{chat_id}/archive"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["archived"], true);
    assert_eq!(json["chat"]["archived"], true);

    let (_, active) = app.get("/api/chats").await;
    assert!(!chat_ids(&active).contains(&chat_id));
    let (_, archived) = app.get("/api/chats/archived/list").await;
    assert_eq!(chat_ids(&archived), vec![chat_id]);

    let (status, json) = app.put(&format!("/api/chats/{chat_id}/restore"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["archived"], false);

    let (_, active) = app.get("/api/chats").await;
    assert!(chat_ids(&active).contains(&chat_id));
    let (_, archived) = app.get("/api/chats/archived/list").await;
    assert!(chat_ids(&archived).is_empty());

    let (_, after) = app.get(&format!("/api/chats/{chat_id}")).await;
    assert_eq!(after["messages"], before["messages"]);
    for field in ["id", "title", "interaction_id", "last_model", "archived", "created_at"] {
        assert_eq!(after["chat"][field], before["chat"][field], "{field}");
    }
}

#[tokio::test]
async fn test_archive_missing_chat() {
    let app = TestApp::new().await;
    let (status, _) = app.put("/api/chats/999/archive", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put("/api/chats/999/restore", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_chat_removes_messages() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({})).await;
    app.send(chat_id, "one", STANDARD_MODEL).await;
    app.send(chat_id, "two", STANDARD_MODEL).await;
    assert_eq!(app.repo().count_messages(chat_id).await.unwrap(), 4);

    let (status, json) = app.delete(&format!("/api/chats/{chat_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], true);
    assert_eq!(app.repo().count_messages(chat_id).await.unwrap(), 0);

    let (status, _) = app.delete(&format!("/api/chats/{chat_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========== Messages ==========

#[tokio::test]
async fn test_first_message_sets_title_and_interaction() {
    let app = TestApp::with_backend(FakeBackend::new().then_reply("Hi!")).await;
    let chat_id = app.create_chat(json!({})).await;
    let content = "Tell me everything about the migration patterns of arctic terns please";

    let (status, json) = app.send(chat_id, content, STANDARD_MODEL).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"]["role"], "model");
    assert_eq!(json["message"]["content"], "Hi!");
    assert_eq!(json["chat"]["title"], content.chars().take(60).collect::<String>().trim());
    assert_eq!(json["chat"]["last_model"], STANDARD_MODEL);
    assert_eq!(json["chat"]["interaction_id"], "fake-interaction-1");

    // Later messages keep the title and continue the interaction.
    let (_, json) = app.send(chat_id, "And the puffins?", STANDARD_MODEL).await;
    assert_eq!(json["chat"]["title"], content.chars().take(60).collect::<String>().trim());
    assert_eq!(
        app.backend.calls().last(),
        Some(&FakeCall::Interaction {
            input: "And the puffins?".into(),
            previous: Some("fake-interaction-1".into()),
        })
    );
}

#[tokio::test]
async fn test_custom_title_is_kept() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({"title": "Mine"})).await;
    let (_, json) = app.send(chat_id, "hello", STANDARD_MODEL).await;
    assert_eq!(json["chat"]["title"], "Mine");
}

#[tokio::test]
async fn test_agent_chat_replays_history_into_new_session() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({})).await;
    let repo = app.repo();
    repo.add_message(chat_id, MessageRole::User, "What is a tern?")
        .await
        .unwrap();
    repo.add_message(chat_id, MessageRole::Model, "A seabird.")
        .await
        .unwrap();

    let (status, json) = app.send(chat_id, "Where do they fly?", AGENT_MODEL).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chat"]["interaction_id"], "fake-session-1");
    assert_eq!(
        app.backend.calls(),
        vec![
            FakeCall::CreateSession {
                agent: AGENT_MODEL.into()
            },
            FakeCall::Send {
                session: "fake-session-1".into(),
                message: "User: What is a tern?\nAssistant: A seabird.\nUser: Where do they fly?"
                    .into(),
            },
        ]
    );
}

#[tokio::test]
async fn test_agent_double_failure_falls_back_to_stateless() {
    let backend = FakeBackend::new()
        .then_fail(GenAiError::Api {
            status: 404,
            message: "session expired".into(),
        })
        .then_fail(GenAiError::Api {
            status: 500,
            message: "agent unavailable".into(),
        })
        .then_reply("from stateless");
    let app = TestApp::with_backend(backend).await;
    let chat_id = app.create_chat(json!({})).await;
    app.repo()
        .complete_turn(
            chat_id,
            "earlier answer",
            "New Chat",
            &InteractionRef::Session("old-session".into()),
            AGENT_MODEL,
        )
        .await
        .unwrap();

    let (status, json) = app.send(chat_id, "continue", AGENT_MODEL).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"]["role"], "model");
    assert_eq!(json["message"]["content"], "from stateless");
    assert_eq!(json["chat"]["interaction_id"], "");

    let calls = app.backend.calls();
    assert_eq!(
        calls[0],
        FakeCall::Send {
            session: "old-session".into(),
            message: "continue".into()
        }
    );
    assert_eq!(
        calls.last(),
        Some(&FakeCall::Generate {
            prompt: "Assistant: earlier answer\nUser: continue".into()
        })
    );
}

#[tokio::test]
async fn test_whitespace_reply_is_bad_gateway() {
    let app = TestApp::with_backend(FakeBackend::new().then_reply(" \n ")).await;
    let chat_id = app.create_chat(json!({})).await;

    let (status, json) = app.send(chat_id, "hello", STANDARD_MODEL).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Gemini returned an empty response.");

    let (_, json) = app.get(&format!("/api/chats/{chat_id}")).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(json["chat"]["title"], "New Chat");
    assert_eq!(json["chat"]["interaction_id"], "");
}

#[tokio::test]
async fn test_agent_timeout_is_gateway_timeout() {
    let backend = FakeBackend::new().then_fail(GenAiError::Timeout { attempts: 180 });
    let app = TestApp::with_backend(backend).await;
    let chat_id = app.create_chat(json!({})).await;

    let (status, json) = app.send(chat_id, "research this", AGENT_MODEL).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["code"], "GATEWAY_TIMEOUT");
    // No fallback after a timeout.
    assert!(
        !app.backend
            .calls()
            .iter()
            .any(|c| matches!(c, FakeCall::Generate { .. }))
    );
}

#[tokio::test]
async fn test_failed_agent_job_is_bad_gateway() {
    let backend = FakeBackend::new().then_fail(GenAiError::JobFailed {
        id: "job-1".into(),
        status: "cancelled".into(),
    });
    let app = TestApp::with_backend(backend).await;
    let chat_id = app.create_chat(json!({})).await;

    let (status, _) = app.send(chat_id, "research this", AGENT_MODEL).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_missing_credentials_is_server_error() {
    let app = TestApp::with_backend(FakeBackend::new().without_credentials()).await;
    let chat_id = app.create_chat(json!({})).await;

    let (status, json) = app.send(chat_id, "hello", STANDARD_MODEL).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
    assert!(app.backend.calls().is_empty());
}

#[tokio::test]
async fn test_without_interactions_standard_turns_are_stateless() {
    let app = TestApp::with_backend(FakeBackend::new().without_interactions()).await;
    let chat_id = app.create_chat(json!({})).await;

    app.send(chat_id, "first", STANDARD_MODEL).await;
    let (status, json) = app.send(chat_id, "second", STANDARD_MODEL).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["chat"]["interaction_id"], "");
    assert_eq!(
        app.backend.calls().last(),
        Some(&FakeCall::Generate {
            prompt: "User: first\nAssistant: reply #1\nUser: second".into()
        })
    );
}

#[tokio::test]
async fn test_send_message_validation() {
    let app = TestApp::new().await;
    let chat_id = app.create_chat(json!({})).await;

    let (status, json) = app.send(chat_id, "   ", STANDARD_MODEL).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Message content is required.");

    let (status, json) = app.send(chat_id, "hello", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Model name is required.");

    let (status, json) = app
        .post(
            &format!("/api/chats/{chat_id}/messages"),
            json!({"content": null, "model_name": STANDARD_MODEL}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "Message content is required.");

    let (status, json) = app
        .post(
            &format!("/api/chats/{chat_id}/messages"),
            json!({"content": "hello"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Model name is required.");

    let (status, _) = app.send(999, "hello", STANDARD_MODEL).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(app.backend.calls().is_empty());
    assert_eq!(app.repo().count_messages(chat_id).await.unwrap(), 0);
}
