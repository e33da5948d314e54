#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::database::sqlite::Database;
use crate::database::sqlite::models::NewKeyValue;
use crate::search::index::DocumentIndex;

pub const CHUNKS_KEY: &str = "document_chunks";
pub const EMBEDDINGS_KEY: &str = "document_embeddings";

/// Persists a [`DocumentIndex`] as two JSON slots: chunk texts and embeddings
#[derive(Debug, Clone)]
pub struct IndexStore {
    database: Database,
}

impl IndexStore {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// The cached index, or `None` when the cache is absent or unusable.
    ///
    /// Both slots must be present and decode to sequences of equal length;
    /// anything else is treated as a miss so the caller rebuilds.
    #[inline]
    pub async fn load(&self) -> Result<Option<DocumentIndex>> {
        let chunks = self.database.get_value(CHUNKS_KEY).await?;
        let embeddings = self.database.get_value(EMBEDDINGS_KEY).await?;

        let (Some(chunks), Some(embeddings)) = (chunks, embeddings) else {
            debug!("Index cache miss: one or both slots are empty");
            return Ok(None);
        };

        let texts: Vec<String> = match serde_json::from_str(&chunks) {
            Ok(texts) => texts,
            Err(e) => {
                warn!("Ignoring cached chunks that failed to decode: {}", e);
                return Ok(None);
            }
        };

        let vectors: Vec<Vec<f32>> = match serde_json::from_str(&embeddings) {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("Ignoring cached embeddings that failed to decode: {}", e);
                return Ok(None);
            }
        };

        match DocumentIndex::from_parts(texts, vectors) {
            Ok(index) => {
                info!("Loaded {} chunks from the index cache", index.len());
                Ok(Some(index))
            }
            Err(e) => {
                warn!("Ignoring inconsistent index cache: {}", e);
                Ok(None)
            }
        }
    }

    /// Write both slots in one transaction
    #[inline]
    pub async fn save(&self, index: &DocumentIndex) -> Result<()> {
        let (texts, embeddings) = index.to_parts();

        let chunks_json =
            serde_json::to_string(&texts).context("Failed to serialize chunk texts")?;
        let embeddings_json =
            serde_json::to_string(&embeddings).context("Failed to serialize embeddings")?;

        self.database
            .set_values(&[
                NewKeyValue::new(CHUNKS_KEY, chunks_json),
                NewKeyValue::new(EMBEDDINGS_KEY, embeddings_json),
            ])
            .await
            .context("Failed to save index cache")?;

        info!("Saved {} chunks to the index cache", index.len());
        Ok(())
    }

    /// Remove both slots; returns whether anything was cached
    #[inline]
    pub async fn clear(&self) -> Result<bool> {
        let deleted = self
            .database
            .delete_values(&[CHUNKS_KEY, EMBEDDINGS_KEY])
            .await
            .context("Failed to clear index cache")?;

        info!("Cleared index cache ({} slots removed)", deleted);
        Ok(deleted > 0)
    }

    /// When the cached chunks were last written
    #[inline]
    pub async fn built_at(&self) -> Result<Option<NaiveDateTime>> {
        Ok(self
            .database
            .get_entry(CHUNKS_KEY)
            .await?
            .map(|entry| entry.updated_date))
    }

    /// Bytes held by both index slots
    #[inline]
    pub async fn stored_bytes(&self) -> Result<usize> {
        let mut total = 0;
        for key in [CHUNKS_KEY, EMBEDDINGS_KEY] {
            if let Some(entry) = self.database.get_entry(key).await? {
                total += entry.size();
            }
        }
        Ok(total)
    }
}
