use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{KeyValueEntry, NewKeyValue};
use crate::database::sqlite::queries::KeyValueQueries;


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// SQLite-backed key-value store
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    /// Open `index.db` inside the application directory, creating both as needed
    #[inline]
    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("index.db");

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(&db_path).await
    }

    #[inline]
    pub async fn get_entry(&self, key: &str) -> Result<Option<KeyValueEntry>> {
        KeyValueQueries::get(&self.pool, key).await
    }

    #[inline]
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_entry(key).await?.map(|entry| entry.value))
    }

    /// Write every entry in a single transaction; either all land or none do
    #[inline]
    pub async fn set_values(&self, entries: &[NewKeyValue<'_>]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        for entry in entries {
            KeyValueQueries::upsert(&mut tx, entry).await?;
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    #[inline]
    pub async fn set_value(&self, key: &str, value: impl Into<String>) -> Result<()> {
        self.set_values(&[NewKeyValue::new(key, value)]).await
    }

    /// Delete the given keys in a single transaction, returning how many existed
    #[inline]
    pub async fn delete_values(&self, keys: &[&str]) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut deleted = 0;
        for key in keys {
            if KeyValueQueries::delete(&mut tx, key).await? {
                deleted += 1;
            }
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(deleted)
    }

    #[cfg(test)]
    pub(crate) async fn list_keys(&self) -> Result<Vec<String>> {
        KeyValueQueries::list_keys(&self.pool).await
    }
}
