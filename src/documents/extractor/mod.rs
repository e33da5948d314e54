
use std::sync::Arc;

use anyhow::Result;

/// Turns the bytes of a binary document into plain text
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// PDF text extraction backed by `pdf-extract`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfTextExtractor {
    #[inline]
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        use anyhow::Context;

        pdf_extract::extract_text_from_mem(bytes).context("Failed to extract text from PDF")
    }
}

#[cfg(not(feature = "pdf"))]
impl TextExtractor for PdfTextExtractor {
    #[inline]
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        UnavailableExtractor.extract(bytes)
    }
}

/// Fails every extraction; stands in when PDF support is not compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableExtractor;

impl TextExtractor for UnavailableExtractor {
    #[inline]
    fn extract(&self, _bytes: &[u8]) -> Result<String> {
        anyhow::bail!("PDF support not enabled. Compile with --features pdf")
    }
}

/// The best extractor this build offers
#[inline]
pub fn default_extractor() -> Arc<dyn TextExtractor> {
    if cfg!(feature = "pdf") {
        Arc::new(PdfTextExtractor)
    } else {
        Arc::new(UnavailableExtractor)
    }
}
