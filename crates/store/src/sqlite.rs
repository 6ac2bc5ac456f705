//! SQLite template registry.
//!
//! Uses a single SQLite database file with one table, `prompt_templates`,
//! keyed by a unique template name. Declared input and output field names
//! are stored comma-joined.

use crate::{join_fields, split_fields};
use async_trait::async_trait;
use chrono::Utc;
use nexus_core::error::StoreError;
use nexus_core::template::{PromptTemplate, TemplateStore};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A SQLite-backed template registry.
pub struct SqliteTemplateStore {
    pool: SqlitePool,
}

impl SqliteTemplateStore {
    /// Open (or create) a registry at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite template registry initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prompt_templates (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT UNIQUE NOT NULL,
                content     TEXT NOT NULL,
                inputs      TEXT NOT NULL DEFAULT '',
                outputs     TEXT NOT NULL DEFAULT '',
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("prompt_templates table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `PromptTemplate` from a SQLite row.
    fn row_to_template(row: &sqlx::sqlite::SqliteRow) -> Result<PromptTemplate, StoreError> {
        let name: String = row
            .try_get("name")
            .map_err(|e| StoreError::QueryFailed(format!("name column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let inputs: String = row
            .try_get("inputs")
            .map_err(|e| StoreError::QueryFailed(format!("inputs column: {e}")))?;
        let outputs: String = row
            .try_get("outputs")
            .map_err(|e| StoreError::QueryFailed(format!("outputs column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(PromptTemplate {
            name,
            content,
            inputs: split_fields(&inputs),
            outputs: split_fields(&outputs),
            updated_at,
        })
    }

    /// Map an INSERT/UPDATE failure, surfacing unique-name violations.
    fn map_write_error(name: &str, e: sqlx::Error) -> StoreError {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Duplicate(name.to_string())
            }
            other => StoreError::Storage(format!("write failed: {other}")),
        }
    }
}

#[async_trait]
impl TemplateStore for SqliteTemplateStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn add(&self, template: PromptTemplate) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO prompt_templates (name, content, inputs, outputs, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&template.name)
        .bind(&template.content)
        .bind(join_fields(&template.inputs))
        .bind(join_fields(&template.outputs))
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_write_error(&template.name, e))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(name = %template.name, "Stored template");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<PromptTemplate>, StoreError> {
        let row = sqlx::query("SELECT * FROM prompt_templates WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("GET by name: {e}")))?;

        match row {
            Some(ref r) => Ok(Some(Self::row_to_template(r)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, name: &str, template: PromptTemplate) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE prompt_templates
            SET name = ?1, content = ?2, inputs = ?3, outputs = ?4, updated_at = ?5
            WHERE name = ?6
            "#,
        )
        .bind(&template.name)
        .bind(&template.content)
        .bind(join_fields(&template.inputs))
        .bind(join_fields(&template.outputs))
        .bind(Utc::now().to_rfc3339())
        .bind(name)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_write_error(&template.name, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(name.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(from = %name, to = %template.name, "Updated template");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM prompt_templates WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected())
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT name FROM prompt_templates ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("LIST names: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get("name")
                    .map_err(|e| StoreError::QueryFailed(format!("name column: {e}")))
            })
            .collect()
    }
}
