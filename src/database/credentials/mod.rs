
use anyhow::Result;
use tracing::{debug, info};

use crate::QaError;
use crate::database::sqlite::Database;

pub const API_KEY_KEY: &str = "openai_api_key";

/// Environment variable that takes precedence over the stored key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const API_KEY_PREFIX: &str = "sk-";

/// Trim `key` and check it carries the `sk-` prefix
#[inline]
pub fn validate_api_key(key: &str) -> Result<String, QaError> {
    let key = key.trim();
    if key.starts_with(API_KEY_PREFIX) {
        Ok(key.to_string())
    } else {
        Err(QaError::InvalidCredential)
    }
}

/// The service API key, kept in the key-value store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    database: Database,
}

impl CredentialStore {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// The key to use: `OPENAI_API_KEY` when set, else the stored one
    #[inline]
    pub async fn api_key(&self) -> Result<Option<String>> {
        self.resolve(std::env::var(API_KEY_ENV).ok()).await
    }

    /// Like [`Self::api_key`] but fails when no key is available
    #[inline]
    pub async fn require_api_key(&self) -> Result<String> {
        self.api_key()
            .await?
            .ok_or_else(|| QaError::MissingCredential.into())
    }

    async fn resolve(&self, env_value: Option<String>) -> Result<Option<String>> {
        if let Some(value) = env_value.filter(|value| !value.trim().is_empty()) {
            debug!("Using API key from {}", API_KEY_ENV);
            return Ok(Some(validate_api_key(&value)?));
        }

        self.stored_key().await
    }

    #[inline]
    pub async fn stored_key(&self) -> Result<Option<String>> {
        self.database.get_value(API_KEY_KEY).await
    }

    /// Validate and persist `key`, returning the trimmed value
    #[inline]
    pub async fn save(&self, key: &str) -> Result<String> {
        let key = validate_api_key(key)?;
        self.database.set_value(API_KEY_KEY, key.as_str()).await?;
        info!("Stored API key");
        Ok(key)
    }
}
