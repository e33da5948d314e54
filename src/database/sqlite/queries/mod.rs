#[cfg(test)]
mod tests;

use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

pub struct KeyValueQueries;

impl KeyValueQueries {
    #[inline]
    pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<KeyValueEntry>> {
        let result = sqlx::query_as::<_, KeyValueEntry>(
            "SELECT key, value, updated_date FROM key_value WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to read key {key:?}"))?;

        Ok(result)
    }

    /// Insert or replace a value. Takes a connection so several writes can
    /// share one transaction.
    #[inline]
    pub async fn upsert(conn: &mut SqliteConnection, entry: &NewKeyValue<'_>) -> Result<()> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO key_value (key, value, updated_date) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_date = excluded.updated_date
            "#,
        )
        .bind(entry.key)
        .bind(&entry.value)
        .bind(now)
        .execute(conn)
        .await
        .with_context(|| format!("Failed to write key {:?}", entry.key))?;

        debug!("Stored {} bytes under {:?}", entry.value.len(), entry.key);
        Ok(())
    }

    #[inline]
    pub async fn delete(conn: &mut SqliteConnection, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM key_value WHERE key = ?")
            .bind(key)
            .execute(conn)
            .await
            .with_context(|| format!("Failed to delete key {key:?}"))?;

        Ok(result.rows_affected() > 0)
    }

    #[cfg(test)]
    pub(crate) async fn list_keys(pool: &SqlitePool) -> Result<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>("SELECT key FROM key_value ORDER BY key")
            .fetch_all(pool)
            .await
            .context("Failed to list stored keys")?;

        Ok(keys)
    }
}
