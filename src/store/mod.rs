//! Effect store - SQLite persistence of per-entity attribute trees
//!
//! One row per entity key holding the JSON form of `EntityEffects::to_tree`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info};

use crate::attributes::AttributeTree;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid stored tree: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored value for '{0}' is not a tree")]
    NotATree(String),
}

/// A stored entity tree
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub id: String,
    pub entity_key: String,
    pub tree: AttributeTree,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Persistent store of entity effect trees
#[derive(Debug, Clone)]
pub struct EffectStore {
    pool: SqlitePool,
}

impl EffectStore {
    /// Open a store. If path is None, uses an in-memory database.
    pub async fn open(path: Option<&str>) -> Result<Self, StoreError> {
        let conn_str = match path {
            Some(p) => format!("sqlite:{}?mode=rwc", p),
            None => "sqlite::memory:".to_string(),
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every in-memory connection is its own database
        let max_connections = if path.is_some() { 5 } else { 1 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running effect store migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entity_effects (
                id TEXT PRIMARY KEY,
                entity_key TEXT UNIQUE NOT NULL,
                tree TEXT NOT NULL DEFAULT '{}',
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace the tree stored for an entity
    pub async fn save_entity(&self, key: &str, tree: &AttributeTree) -> Result<(), StoreError> {
        let json = serde_json::to_string(tree)?;
        let id = uuid::Uuid::new_v4().to_string();
        let saved_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO entity_effects (id, entity_key, tree, saved_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(entity_key) DO UPDATE SET
                tree = excluded.tree,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(&id)
        .bind(key)
        .bind(&json)
        .bind(&saved_at)
        .execute(&self.pool)
        .await?;

        debug!("Saved effects for {}", key);
        Ok(())
    }

    /// Load the tree stored for an entity
    pub async fn load_entity(&self, key: &str) -> Result<Option<AttributeTree>, StoreError> {
        Ok(self.load_record(key).await?.map(|record| record.tree))
    }

    /// Load the full row stored for an entity
    pub async fn load_record(&self, key: &str) -> Result<Option<StoredEntity>, StoreError> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, entity_key, tree, saved_at FROM entity_effects WHERE entity_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, entity_key, json, saved_at)) = row else {
            return Ok(None);
        };

        let value: serde_json::Value = serde_json::from_str(&json)?;
        let tree =
            AttributeTree::from_value(value).ok_or_else(|| StoreError::NotATree(key.to_string()))?;
        let saved_at = DateTime::parse_from_rfc3339(&saved_at)
            .ok()
            .map(|t| t.with_timezone(&Utc));

        Ok(Some(StoredEntity {
            id,
            entity_key,
            tree,
            saved_at,
        }))
    }

    /// Delete an entity's tree. Returns whether a row was removed.
    pub async fn delete_entity(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM entity_effects WHERE entity_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Keys of every stored entity, sorted
    pub async fn entity_keys(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT entity_key FROM entity_effects ORDER BY entity_key")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}
