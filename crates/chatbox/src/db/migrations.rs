//! Versioned schema migrations.
//!
//! The applied version lives in `schema_meta` under [`SCHEMA_VERSION_KEY`].
//! Each migration runs in its own transaction and bumps the version on commit.
//!
//! Databases written by the pre-versioning application have the tables but no
//! version row. They start at version 0: the `IF NOT EXISTS` statements are
//! no-ops for them and an `ADD COLUMN` whose column is already present counts
//! as applied.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Key of the schema version row in `schema_meta`.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// A single schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

/// All migrations in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create models, chats and messages",
        statements: &[
            r#"
            CREATE TABLE IF NOT EXISTS models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS chats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                interaction_id TEXT NOT NULL,
                last_model TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(chat_id) REFERENCES chats(id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages(chat_id)",
        ],
    },
    Migration {
        version: 2,
        description: "add chat archiving",
        statements: &[
            "ALTER TABLE chats ADD COLUMN archived BOOLEAN NOT NULL DEFAULT 0",
            "CREATE INDEX IF NOT EXISTS idx_chats_archived ON chats(archived)",
        ],
    },
];

const META_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// Apply every migration newer than the recorded version.
///
/// Returns the schema version after the run.
pub(crate) async fn run(pool: &SqlitePool) -> Result<i64> {
    sqlx::raw_sql(META_SCHEMA)
        .execute(pool)
        .await
        .context("creating schema_meta table")?;

    let start = current_version(pool).await?;
    let mut version = start;

    for migration in MIGRATIONS.iter().filter(|m| m.version > start) {
        apply(pool, migration).await?;
        info!(
            version = migration.version,
            description = migration.description,
            "applied schema migration"
        );
        version = migration.version;
    }

    Ok(version)
}

/// Read the recorded schema version, 0 when none has been recorded.
pub(crate) async fn current_version(pool: &SqlitePool) -> Result<i64> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM schema_meta WHERE key = ?")
        .bind(SCHEMA_VERSION_KEY)
        .fetch_optional(pool)
        .await
        .context("reading schema version")?;

    match value {
        Some(v) => v
            .parse::<i64>()
            .with_context(|| format!("invalid schema version: {v}")),
        None => Ok(0),
    }
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .with_context(|| format!("starting migration {}", migration.version))?;

    for statement in migration.statements {
        match sqlx::query(statement).execute(&mut *tx).await {
            Ok(_) => {}
            Err(err) if is_duplicate_column(&err) => {
                debug!(
                    version = migration.version,
                    "column already present, skipping statement"
                );
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!(
                        "applying migration {} ({})",
                        migration.version, migration.description
                    )
                });
            }
        }
    }

    sqlx::query(
        r#"
        INSERT INTO schema_meta (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(SCHEMA_VERSION_KEY)
    .bind(migration.version.to_string())
    .execute(&mut *tx)
    .await
    .context("recording schema version")?;

    tx.commit()
        .await
        .with_context(|| format!("committing migration {}", migration.version))
}

fn is_duplicate_column(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("duplicate column name"),
        _ => false,
    }
}
