// Documents module
// Discovery and loading of the source documents that make up the corpus


pub mod directory;
pub mod extractor;
pub mod http;

pub use directory::DirectoryDocumentSource;
pub use extractor::{PdfTextExtractor, TextExtractor, UnavailableExtractor, default_extractor};
pub use http::HttpDocumentSource;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::QaError;
use crate::config::{Config, DocumentLocation};
use crate::embeddings::chunking::PARAGRAPH_SEPARATOR;
use crate::progress::ProgressReporter;
use crate::search::index::source_tag;

/// Used whenever a source cannot produce a listing
pub const FALLBACK_FILES: [&str; 4] = [
    "Test.txt",
    "sample.pdf",
    "Cross Attention Model.pdf",
    "2112.10752v2.pdf",
];

/// How a document's bytes become text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Unsupported,
}

impl DocumentKind {
    /// Classify by extension, ignoring case
    #[inline]
    pub fn from_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("txt" | "md") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    #[inline]
    pub fn is_supported(self) -> bool {
        self != Self::Unsupported
    }
}

/// What happened to a single document during loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Loaded { chars: usize },
    Skipped { reason: String },
    Failed { reason: String },
}

impl DocumentOutcome {
    #[inline]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// A place documents are listed and fetched from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Names of the available documents, in load order
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<String>>;

    /// Raw bytes of the named document
    async fn fetch(&self, name: &str, cancel: &CancellationToken) -> Result<Vec<u8>>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Build the source for the configured document location
#[inline]
pub fn source_for(config: &Config) -> Result<Box<dyn DocumentSource>> {
    let location = config
        .document_location()
        .context("Invalid document location")?;

    let source: Box<dyn DocumentSource> = match location {
        DocumentLocation::Remote(url) => {
            Box::new(HttpDocumentSource::new(url, config.service.timeout()))
        }
        DocumentLocation::Directory(path) => {
            let path = if path.is_relative() {
                config.get_base_dir().join(path)
            } else {
                path
            };
            Box::new(DirectoryDocumentSource::new(path))
        }
    };

    Ok(source)
}

/// Concatenated text of every loaded document plus the per-document outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub text: String,
    pub documents: Vec<(String, DocumentOutcome)>,
}

impl Corpus {
    #[inline]
    pub fn loaded_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|(_, outcome)| outcome.is_loaded())
            .count()
    }
}

/// The source's listing, or [`FALLBACK_FILES`] when listing fails
#[inline]
pub async fn discover_files(
    source: &dyn DocumentSource,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    match source.list(cancel).await {
        Ok(files) => {
            info!("Discovered {} documents at {}", files.len(), source.describe());
            Ok(files)
        }
        Err(e) if is_cancelled(&e) => Err(e),
        Err(e) => {
            warn!(
                "Auto-discovery failed for {}, using fallback files: {:#}",
                source.describe(),
                e
            );
            Ok(FALLBACK_FILES.iter().map(|name| (*name).to_string()).collect())
        }
    }
}

/// Fetch and extract every discovered document into one corpus.
///
/// Each document contributes `FILE: <name>` followed by its text and a blank
/// line. A document that cannot be fetched or extracted is recorded in the
/// outcomes and left out; only cancellation aborts the whole load.
#[inline]
pub async fn load_documents(
    source: &dyn DocumentSource,
    extractor: Arc<dyn TextExtractor>,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> Result<Corpus> {
    let files = discover_files(source, cancel).await?;
    let total = files.len();
    let mut corpus = Corpus::default();

    for (index, name) in files.into_iter().enumerate() {
        progress.document_started(&name, index, total);

        let outcome = match load_document(source, &extractor, &name, cancel).await {
            Ok(Some(text)) => {
                // The tag and the first line of text must stay in one paragraph
                let text = text.trim_start();
                let chars = text.chars().count();
                corpus.text.push_str(&source_tag(&name));
                corpus.text.push_str(text);
                corpus.text.push_str(PARAGRAPH_SEPARATOR);
                debug!("Loaded {} ({} chars)", name, chars);
                DocumentOutcome::Loaded { chars }
            }
            Ok(None) => {
                let reason = match DocumentKind::from_name(&name) {
                    DocumentKind::Unsupported => "unsupported file type",
                    _ => "no text found",
                };
                debug!("Skipped {}: {}", name, reason);
                DocumentOutcome::Skipped {
                    reason: reason.to_string(),
                }
            }
            Err(e) if is_cancelled(&e) => return Err(e),
            Err(e) => {
                warn!("Error processing {}: {:#}", name, e);
                DocumentOutcome::Failed {
                    reason: format!("{e:#}"),
                }
            }
        };

        progress.document_finished(&name, &outcome);
        corpus.documents.push((name, outcome));
    }

    info!(
        "Loaded {} of {} documents ({} chars)",
        corpus.loaded_count(),
        total,
        corpus.text.chars().count()
    );

    Ok(corpus)
}

async fn load_document(
    source: &dyn DocumentSource,
    extractor: &Arc<dyn TextExtractor>,
    name: &str,
    cancel: &CancellationToken,
) -> Result<Option<String>> {
    let kind = DocumentKind::from_name(name);
    if !kind.is_supported() {
        return Ok(None);
    }

    let bytes = source.fetch(name, cancel).await?;

    let text = match kind {
        DocumentKind::Pdf => {
            let extractor = Arc::clone(extractor);
            let file = name.to_string();
            tokio::task::spawn_blocking(move || {
                extractor.extract(&bytes).map_err(|e| {
                    anyhow::Error::from(QaError::Extraction {
                        file,
                        reason: format!("{e:#}"),
                    })
                })
            })
            .await
            .map_err(|e| {
                anyhow::Error::from(QaError::Extraction {
                    file: name.to_string(),
                    reason: format!("extractor crashed: {e}"),
                })
            })??
        }
        DocumentKind::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentKind::Unsupported => return Ok(None),
    };

    Ok((!text.trim().is_empty()).then_some(text))
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<QaError>(), Some(QaError::Cancelled))
}
