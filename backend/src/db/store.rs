//! JSON key-value store over the `kv` table.
//!
//! Values are whole JSON documents. There is no expiry, versioning or schema
//! validation; callers own the shape of what they store.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;

use crate::errors::AppError;

/// Persistent key-value store.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    prefix: String,
    max_bytes: usize,
}

impl Store {
    pub fn new(pool: SqlitePool, prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
            max_bytes,
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Read and parse the value under `key`.
    ///
    /// Returns `None` when the key is absent, the stored text is not valid
    /// JSON for `T`, or the database cannot be read.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.raw(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, "Store read failed: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, "Discarding unparseable stored value: {}", e);
                None
            }
        }
    }

    /// Stored JSON text under `key`, unparsed.
    pub async fn raw(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?")
            .bind(self.full_key(key))
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Serialize `value` and write it under `key`, replacing any previous value.
    ///
    /// Fails with [`AppError::Storage`] when serialization fails or when the
    /// write would push the total stored size over the quota.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)?;
        let full_key = self.full_key(key);

        let mut tx = self.pool.begin().await?;

        let others = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv WHERE key != ?",
        )
        .bind(&full_key)
        .fetch_one(&mut *tx)
        .await?;

        let total = others.max(0) as usize + json.len();
        if total > self.max_bytes {
            return Err(AppError::Storage(format!(
                "Storage quota exceeded writing '{}': {} of {} bytes",
                key, total, self.max_bytes
            )));
        }

        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&full_key)
        .bind(&json)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete `key`. Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(self.full_key(key))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
