//! Database module for chat persistence.
//!
//! One SQLite file holds the `models`, `chats` and `messages` tables. The
//! schema is brought up to date by [`migrations`] every time the database is
//! opened, and the default model list is seeded the first time the `models`
//! table is seen empty.

mod migrations;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub use migrations::{MIGRATIONS, Migration, SCHEMA_VERSION_KEY};

/// File name of the chat database inside the data directory.
pub const DATABASE_FILE: &str = "chatbox.db";

/// Models inserted the first time the database is initialized, in order.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-3-flash-preview",
    "gemini-3-pro-preview",
    "deep-research-pro-preview-12-2025",
];

/// Marker recorded once the default models have been seeded.
const MODELS_SEEDED_KEY: &str = "models_seeded";

/// Current UTC time with second precision, e.g. `2026-01-31T12:00:00Z`.
pub fn utc_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Database connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the chat database at `path`.
    ///
    /// Creates parent directories, applies pending migrations and seeds the
    /// default models. Safe to call repeatedly on the same file.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory: {}", parent.display()))?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .context("parsing database URL")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("connecting to database: {}", path.display()))?;

        let db = Self {
            pool,
            path: Some(path.to_path_buf()),
        };
        db.initialize().await?;

        Ok(db)
    }

    /// Create an in-memory database (for testing).
    ///
    /// Every pooled connection to `sqlite::memory:` is a separate database, so
    /// the pool is pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("parsing in-memory database URL")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("connecting to in-memory database")?;

        let db = Self { pool, path: None };
        db.initialize().await?;

        Ok(db)
    }

    /// Run migrations and seed default data.
    pub async fn initialize(&self) -> Result<()> {
        let version = migrations::run(&self.pool).await?;
        debug!(schema_version = version, "database schema up to date");
        self.seed_default_models().await
    }

    /// Insert [`DEFAULT_MODELS`] when the table has never been seeded and is empty.
    async fn seed_default_models(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("starting seed transaction")?;

        let seeded = sqlx::query_scalar::<_, String>("SELECT value FROM schema_meta WHERE key = ?")
            .bind(MODELS_SEEDED_KEY)
            .fetch_optional(&mut *tx)
            .await
            .context("reading seed marker")?;
        if seeded.is_some() {
            return Ok(());
        }

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM models")
            .fetch_one(&mut *tx)
            .await
            .context("counting models")?;

        let now = utc_now();
        if existing == 0 {
            for name in DEFAULT_MODELS {
                sqlx::query("INSERT INTO models (name, created_at) VALUES (?, ?)")
                    .bind(name)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("seeding model {name}"))?;
            }
            info!(count = DEFAULT_MODELS.len(), "seeded default models");
        }

        sqlx::query("INSERT INTO schema_meta (key, value) VALUES (?, ?)")
            .bind(MODELS_SEEDED_KEY)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("recording seed marker")?;

        tx.commit().await.context("committing seed transaction")?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Database file path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current schema version.
    pub async fn schema_version(&self) -> Result<i64> {
        migrations::current_version(&self.pool).await
    }

    /// Check if the database is healthy.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// Close the database connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
