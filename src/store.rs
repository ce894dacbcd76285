//! Token Store
//!
//! Persistent token -> file_id mapping over a single SQLite table:
//!
//! ```sql
//! links(token TEXT PRIMARY KEY, file_id TEXT NOT NULL)
//! ```
//!
//! Records are written once by the issuance flow and only ever read after
//! that; there is no expiry and no explicit deletion. Each call is one
//! independent statement - the system never mutates more than one record per
//! call, so no transactions are needed.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::telegram::traits::FileHandle;

/// Token store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// SQLite-backed token store. Cheap to clone; clones share one pool.
#[derive(Debug, Clone)]
pub struct LinkStore {
    pool: SqlitePool,
}

impl LinkStore {
    /// Open (or create) the link database at `path` and ensure the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS links (token TEXT PRIMARY KEY, file_id TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Upsert a token record. A duplicate token overwrites the prior record
    /// and never fails the caller.
    pub async fn put(&self, token: &str, file: &FileHandle) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO links (token, file_id) VALUES (?1, ?2)")
            .bind(token)
            .bind(&file.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Point lookup. A missing token is `Ok(None)`, never an error.
    pub async fn get(&self, token: &str) -> Result<Option<FileHandle>, StoreError> {
        let file_id: Option<String> =
            sqlx::query_scalar("SELECT file_id FROM links WHERE token = ?1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        Ok(file_id.map(FileHandle))
    }
}
