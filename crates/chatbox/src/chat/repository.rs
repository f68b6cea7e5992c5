//! Repository for chat database operations.

use sqlx::SqlitePool;
use tracing::instrument;

use super::error::{StoreError, StoreResult};
use super::models::{
    Chat, ChatFilter, ChatMessage, DEFAULT_CHAT_TITLE, InteractionRef, MessageRole, Model,
};
use crate::db::utc_now;

const CHAT_COLUMNS: &str =
    "id, title, interaction_id, last_model, archived, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, role, content, created_at";

/// Repository for models, chats and messages.
#[derive(Debug, Clone)]
pub struct ChatRepository {
    pool: SqlitePool,
}

impl ChatRepository {
    /// Create a new repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========== Model Operations ==========

    /// List models by id.
    pub async fn list_models(&self) -> StoreResult<Vec<Model>> {
        let models = sqlx::query_as::<_, Model>(
            "SELECT id, name, created_at FROM models ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(models)
    }

    /// Get a model by id.
    pub async fn get_model(&self, id: i64) -> StoreResult<Option<Model>> {
        let model = sqlx::query_as::<_, Model>("SELECT id, name, created_at FROM models WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    /// Add a model. Fails with `Conflict` when the name is taken.
    #[instrument(skip(self))]
    pub async fn create_model(&self, name: &str) -> StoreResult<Model> {
        let now = utc_now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO models (name, created_at) VALUES (?, ?) RETURNING id",
        )
        .bind(name)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_write(e, "Model"))?;

        Ok(Model {
            id,
            name: name.to_string(),
            created_at: now,
        })
    }

    /// Rename a model.
    #[instrument(skip(self))]
    pub async fn rename_model(&self, id: i64, name: &str) -> StoreResult<Model> {
        let result = sqlx::query("UPDATE models SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, "Model"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Model".to_string()));
        }

        self.get_model(id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Model".to_string()))
    }

    /// Delete a model. Chats keep referring to it by name.
    #[instrument(skip(self))]
    pub async fn delete_model(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM models WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Model".to_string()));
        }
        Ok(())
    }

    /// Count models.
    pub async fn count_models(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM models")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ========== Chat Operations ==========

    /// List chats, most recently updated first.
    pub async fn list_chats(&self, filter: ChatFilter) -> StoreResult<Vec<Chat>> {
        let condition = match filter {
            ChatFilter::Active => "WHERE archived = 0",
            ChatFilter::Archived => "WHERE archived = 1",
            ChatFilter::All => "",
        };
        let sql = format!(
            "SELECT {CHAT_COLUMNS} FROM chats {condition} ORDER BY updated_at DESC, id DESC"
        );

        let chats = sqlx::query_as::<_, Chat>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(chats)
    }

    /// Get a chat by id.
    pub async fn get_chat(&self, id: i64) -> StoreResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(chat)
    }

    async fn require_chat(&self, id: i64) -> StoreResult<Chat> {
        self.get_chat(id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Chat".to_string()))
    }

    /// Create a chat with no interaction reference.
    #[instrument(skip(self))]
    pub async fn create_chat(&self, title: &str, model_name: Option<&str>) -> StoreResult<Chat> {
        let now = utc_now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO chats (title, interaction_id, last_model, archived, created_at, updated_at)
            VALUES (?, '', ?, 0, ?, ?)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(model_name)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        self.require_chat(id).await
    }

    /// Rename a chat and bump its update time.
    #[instrument(skip(self))]
    pub async fn rename_chat(&self, id: i64, title: &str) -> StoreResult<Chat> {
        let result = sqlx::query("UPDATE chats SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(utc_now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Chat".to_string()));
        }
        self.require_chat(id).await
    }

    /// Archive or restore a chat and bump its update time.
    #[instrument(skip(self))]
    pub async fn set_archived(&self, id: i64, archived: bool) -> StoreResult<Chat> {
        let result = sqlx::query("UPDATE chats SET archived = ?, updated_at = ? WHERE id = ?")
            .bind(archived)
            .bind(utc_now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Chat".to_string()));
        }
        self.require_chat(id).await
    }

    /// Delete a chat together with its messages.
    #[instrument(skip(self))]
    pub async fn delete_chat(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE chat_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Nothing was deleted; dropping the transaction rolls it back.
            return Err(StoreError::NotFound("Chat".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    // ========== Message Operations ==========

    /// Append a message to a chat.
    pub async fn add_message(
        &self,
        chat_id: i64,
        role: MessageRole,
        content: &str,
    ) -> StoreResult<ChatMessage> {
        let message = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            INSERT INTO messages (chat_id, role, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(chat_id)
        .bind(role.as_str())
        .bind(content)
        .bind(utc_now())
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// All messages of a chat in creation order.
    pub async fn list_messages(&self, chat_id: i64) -> StoreResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ? ORDER BY id"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// The last `limit` messages before `before_id`, oldest first.
    pub async fn recent_messages(
        &self,
        chat_id: i64,
        before_id: i64,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let mut messages = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE chat_id = ? AND id < ?
            ORDER BY id DESC
            LIMIT ?
            "#
        ))
        .bind(chat_id)
        .bind(before_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    /// Count messages belonging to a chat.
    pub async fn count_messages(&self, chat_id: i64) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Store a model reply and the chat metadata it produced, atomically.
    ///
    /// `auto_title` only replaces the title while it is still the default,
    /// so a rename made while the turn was running is kept.
    #[instrument(skip(self, reply))]
    pub async fn complete_turn(
        &self,
        chat_id: i64,
        reply: &str,
        auto_title: &str,
        interaction: &InteractionRef,
        model_name: &str,
    ) -> StoreResult<(ChatMessage, Chat)> {
        let now = utc_now();
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            INSERT INTO messages (chat_id, role, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(chat_id)
        .bind(MessageRole::Model.as_str())
        .bind(reply)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        let chat = sqlx::query_as::<_, Chat>(&format!(
            r#"
            UPDATE chats
            SET title = CASE WHEN title = ? THEN ? ELSE title END,
                interaction_id = ?, last_model = ?, updated_at = ?
            WHERE id = ?
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(DEFAULT_CHAT_TITLE)
        .bind(auto_title)
        .bind(interaction.as_str())
        .bind(model_name)
        .bind(&now)
        .bind(chat_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound("Chat".to_string()))?;

        tx.commit().await?;
        Ok((message, chat))
    }
}
