
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::completion::DEFAULT_COMPLETION_MODEL;
use crate::embeddings::chunking::DEFAULT_CHUNK_SIZE;
use crate::embeddings::openai::{DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_MODEL};
use crate::search::context::DEFAULT_MAX_CONTEXT_LENGTH;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_DOCUMENTS_LOCATION: &str = "documents";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Hosted embedding and chat-completion service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub completion_model: String,
    pub batch_size: u32,
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// Chunking and context-window sizes, in characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub chunk_size: usize,
    pub max_context_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_context_length: DEFAULT_MAX_CONTEXT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentsConfig {
    /// An http(s) URL serving a directory listing, or a local directory
    pub location: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_DOCUMENTS_LOCATION.to_string(),
        }
    }
}

/// Where documents are discovered and fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    Remote(Url),
    Directory(PathBuf),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid batch size: {0} (must be between 1 and 2048)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0:?} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid chunk size: {0} (must be between 100 and 100000)")]
    InvalidChunkSize(usize),
    #[error("Max context length ({0}) must be at least the chunk size ({1})")]
    ContextTooSmall(usize, usize),
    #[error("Invalid document location: {0:?} (cannot be empty)")]
    InvalidDocumentLocation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Default application directory, `~/.docs-qa`
    #[inline]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".docs-qa"))
            .or_else(|| dirs::data_dir().map(|data| data.join("docs-qa")))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        self.retrieval.validate()?;
        self.documents.validate()?;
        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Path of the SQLite key-value store holding the index cache and credential
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.get_base_dir().join("index.db")
    }

    #[inline]
    pub fn service_url(&self) -> Result<Url, ConfigError> {
        self.service.service_url()
    }

    #[inline]
    pub fn document_location(&self) -> Result<DocumentLocation, ConfigError> {
        self.documents.location()
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service_url()?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.completion_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.completion_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 2048 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        Ok(())
    }

    /// Base URL of the service API, always ending in `/` so endpoint names join beneath it
    pub fn service_url(&self) -> Result<Url, ConfigError> {
        parse_directory_url(&self.base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn set_base_url(&mut self, base_url: String) -> Result<(), ConfigError> {
        parse_directory_url(&base_url)?;
        self.base_url = base_url;
        Ok(())
    }

    pub fn set_embedding_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.embedding_model = model;
        Ok(())
    }

    pub fn set_completion_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.completion_model = model;
        Ok(())
    }

    pub fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 2048 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }

    pub fn set_timeout_seconds(&mut self, timeout_seconds: u64) -> Result<(), ConfigError> {
        if !(1..=600).contains(&timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(timeout_seconds));
        }
        self.timeout_seconds = timeout_seconds;
        Ok(())
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=100_000).contains(&self.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }

        if self.max_context_length < self.chunk_size {
            return Err(ConfigError::ContextTooSmall(
                self.max_context_length,
                self.chunk_size,
            ));
        }

        Ok(())
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<(), ConfigError> {
        let candidate = RetrievalConfig {
            chunk_size,
            ..self.clone()
        };
        candidate.validate()?;
        self.chunk_size = chunk_size;
        Ok(())
    }

    pub fn set_max_context_length(&mut self, max_context_length: usize) -> Result<(), ConfigError> {
        let candidate = RetrievalConfig {
            max_context_length,
            ..self.clone()
        };
        candidate.validate()?;
        self.max_context_length = max_context_length;
        Ok(())
    }
}

impl DocumentsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.location().map(|_| ())
    }

    pub fn location(&self) -> Result<DocumentLocation, ConfigError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(ConfigError::InvalidDocumentLocation(self.location.clone()));
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            parse_directory_url(location).map(DocumentLocation::Remote)
        } else {
            Ok(DocumentLocation::Directory(PathBuf::from(location)))
        }
    }

    pub fn set_location(&mut self, location: String) -> Result<(), ConfigError> {
        let candidate = DocumentsConfig { location };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

fn parse_directory_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
