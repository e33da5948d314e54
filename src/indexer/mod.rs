// Indexer module
// Ingestion: load documents, chunk, embed and persist the document index


use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::database::sqlite::Database;
use crate::database::IndexStore;
use crate::documents::{DocumentOutcome, DocumentSource, TextExtractor, load_documents};
use crate::embeddings::EmbeddingClient;
use crate::embeddings::chunking::split_into_chunks;
use crate::progress::ProgressReporter;
use crate::search::index::DocumentIndex;

/// Where an index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    Cache,
    Built,
}

impl fmt::Display for IndexOrigin {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IndexOrigin::Cache => write!(f, "cache"),
            IndexOrigin::Built => write!(f, "built"),
        }
    }
}

/// Summary of an ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    /// Per-document outcomes in load order; empty when the cache was used
    pub documents: Vec<(String, DocumentOutcome)>,
    pub chunk_count: usize,
    pub origin: IndexOrigin,
}

/// Builds the document index and keeps the cache in step with it
pub struct Indexer {
    store: IndexStore,
    embeddings: EmbeddingClient,
    source: Box<dyn DocumentSource>,
    extractor: Arc<dyn TextExtractor>,
    chunk_size: usize,
}

impl Indexer {
    #[inline]
    pub fn new(
        config: &Config,
        database: Database,
        embeddings: EmbeddingClient,
        source: Box<dyn DocumentSource>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            store: IndexStore::new(database),
            embeddings,
            source,
            extractor,
            chunk_size: config.retrieval.chunk_size,
        }
    }

    #[inline]
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    #[inline]
    pub fn embeddings(&self) -> &EmbeddingClient {
        &self.embeddings
    }

    /// The cached index when one is usable, otherwise a freshly built one.
    ///
    /// `force` skips the cache and always rebuilds.
    #[inline]
    pub async fn load_or_build(
        &self,
        force: bool,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(DocumentIndex, IngestionReport)> {
        if !force {
            if let Some(index) = self.store.load().await? {
                let report = IngestionReport {
                    documents: Vec::new(),
                    chunk_count: index.len(),
                    origin: IndexOrigin::Cache,
                };
                return Ok((index, report));
            }
        }

        self.build(progress, cancel).await
    }

    /// Run the full ingestion pipeline and cache the result.
    ///
    /// The cache is written only after every chunk has been embedded; a failed
    /// run leaves whatever was cached before untouched.
    #[inline]
    pub async fn build(
        &self,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(DocumentIndex, IngestionReport)> {
        info!("Building document index from {}", self.source.describe());

        let corpus = load_documents(
            self.source.as_ref(),
            Arc::clone(&self.extractor),
            progress,
            cancel,
        )
        .await?;

        let chunks = split_into_chunks(&corpus.text, self.chunk_size);
        info!(
            "Split {} chars into {} chunks of at most {} chars",
            corpus.text.chars().count(),
            chunks.len(),
            self.chunk_size
        );

        let embeddings = self
            .embeddings
            .embed_chunks(&chunks, progress, cancel)
            .await
            .inspect_err(|e| error!("Ingestion aborted: {:#}", e))?;

        let index = DocumentIndex::from_parts(chunks, embeddings)
            .context("Embedding service returned misaligned results")?;

        self.store.save(&index).await?;
        progress.finished();

        let report = IngestionReport {
            documents: corpus.documents,
            chunk_count: index.len(),
            origin: IndexOrigin::Built,
        };

        Ok((index, report))
    }
}
