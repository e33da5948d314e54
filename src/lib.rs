use thiserror::Error;

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Document discovery failed: {0}")]
    Discovery(String),

    #[error("Failed to extract text from {file}: {reason}")]
    Extraction { file: String, reason: String },

    #[error("Embedding error: {0}")]
    EmbeddingService(String),

    #[error("API Error: {0}")]
    CompletionService(String),

    #[error("Please enter a valid OpenAI API key (starts with sk-)")]
    InvalidCredential,

    #[error("No API key configured. Run `docs-qa key` to set one")]
    MissingCredential,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod completion;
pub mod config;
pub mod database;
pub mod documents;
pub mod embeddings;
pub mod indexer;
pub mod progress;
pub mod search;
pub mod session;

mod http;

#[cfg(test)]
mod test_support;
