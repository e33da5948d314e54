
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::QaError;
use crate::documents::{DocumentKind, DocumentSource};

/// Documents stored as files in a local directory
#[derive(Debug, Clone)]
pub struct DirectoryDocumentSource {
    root: PathBuf,
}

impl DirectoryDocumentSource {
    #[inline]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSource for DirectoryDocumentSource {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        if cancel.is_cancelled() {
            return Err(QaError::Cancelled.into());
        }

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            QaError::Discovery(format!("cannot read {}: {e}", self.root.display()))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to list {}", self.root.display()))?
        {
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_file && DocumentKind::from_name(&name).is_supported() {
                files.push(name);
            }
        }

        files.sort();
        debug!("Directory {} holds {} documents", self.root.display(), files.len());
        Ok(files)
    }

    async fn fetch(&self, name: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(QaError::Cancelled.into());
        }

        let path = self.root.join(name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
