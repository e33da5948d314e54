
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use crate::QaError;
use crate::config::Config;
use crate::http::{build_agent, post_json, run_cancellable, service_error_message};
use crate::progress::ProgressReporter;

pub const DEFAULT_BATCH_SIZE: u32 = 10;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Client for an OpenAI-compatible `/embeddings` endpoint
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    endpoint: Url,
    model: String,
    batch_size: usize,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = config
            .service_url()
            .context("Failed to build service URL from config")?
            .join("embeddings")
            .context("Failed to build embeddings URL")?;

        Ok(Self {
            endpoint,
            model: config.service.embedding_model.clone(),
            batch_size: config.service.batch_size.max(1) as usize,
            api_key: api_key.into(),
            agent: build_agent(config.service.timeout()),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed every chunk, returning one embedding per chunk in the same order.
    ///
    /// Batches are sent one at a time; the next request is not issued until the
    /// previous one has completed. Any failed batch fails the whole call and the
    /// embeddings gathered so far are dropped.
    #[inline]
    pub async fn embed_chunks(
        &self,
        chunks: &[String],
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<f32>>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let total = chunks.len();
        info!(
            "Generating embeddings for {} chunks in batches of {}",
            total, self.batch_size
        );

        let mut embeddings = Vec::with_capacity(total);

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            progress.embedding_progress(offset, total);

            let batch_embeddings = self.embed_batch(batch, cancel).await.inspect_err(|e| {
                error!("Embedding batch at offset {} failed: {:#}", offset, e);
            })?;

            embeddings.extend(batch_embeddings);
        }

        progress.embedding_progress(total, total);
        debug!("Generated {} embeddings total", embeddings.len());

        Ok(embeddings)
    }

    /// Embed a single query text
    #[inline]
    pub async fn embed_query(&self, text: &str, cancel: &CancellationToken) -> Result<Vec<f32>> {
        debug!("Generating query embedding (length: {})", text.len());

        let mut embeddings = self.embed_batch(&[text.to_string()], cancel).await?;
        embeddings.pop().ok_or_else(|| {
            anyhow::Error::from(QaError::EmbeddingService(
                "service returned no embedding for the query".to_string(),
            ))
        })
    }

    async fn embed_batch(
        &self,
        batch: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input: batch,
            model: &self.model,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        debug!("Requesting embeddings for batch of {} texts", batch.len());

        let agent = self.agent.clone();
        let url = self.endpoint.to_string();
        let api_key = self.api_key.clone();

        let response = run_cancellable(cancel, move || {
            post_json(&agent, &url, &api_key, &request_json).map_err(|e| {
                anyhow::Error::from(QaError::Network(format!("Embedding request failed: {e}")))
            })
        })
        .await?;

        if !response.is_success() {
            return Err(QaError::EmbeddingService(service_error_message(&response)).into());
        }

        let parsed: EmbeddingResponse = serde_json::from_slice(&response.body)
            .context("Failed to parse embedding response")?;

        if parsed.data.len() != batch.len() {
            return Err(QaError::EmbeddingService(format!(
                "Mismatch between request and response counts: {} vs {}",
                batch.len(),
                parsed.data.len()
            ))
            .into());
        }

        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}
