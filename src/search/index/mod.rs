
use anyhow::{Result, bail};
use itertools::Itertools;

/// Leading line that marks where a source document begins in the corpus
pub const SOURCE_TAG_PREFIX: &str = "FILE: ";

/// The `FILE: <name>` line placed in front of a document's text
#[inline]
pub fn source_tag(name: &str) -> String {
    format!("{SOURCE_TAG_PREFIX}{name}\n")
}

/// A retrievable chunk together with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Ordered chunks with their embeddings; position is the chunk's identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentIndex {
    chunks: Vec<IndexedChunk>,
}

impl DocumentIndex {
    #[inline]
    pub fn new(chunks: Vec<IndexedChunk>) -> Self {
        Self { chunks }
    }

    /// Pair chunk texts with embeddings by position.
    ///
    /// Fails when the two sequences differ in length, since the pairing would
    /// then be meaningless.
    #[inline]
    pub fn from_parts(texts: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if texts.len() != embeddings.len() {
            bail!(
                "Chunk and embedding counts differ: {} chunks, {} embeddings",
                texts.len(),
                embeddings.len()
            );
        }

        let chunks = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedChunk { text, embedding })
            .collect();

        Ok(Self { chunks })
    }

    /// Split back into the parallel text and embedding sequences used for persistence
    #[inline]
    pub fn to_parts(&self) -> (Vec<&str>, Vec<&[f32]>) {
        self.chunks
            .iter()
            .map(|chunk| (chunk.text.as_str(), chunk.embedding.as_slice()))
            .unzip()
    }

    #[inline]
    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimensionality, taken from the first chunk
    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.first().map(|chunk| chunk.embedding.len())
    }

    /// Names of the source documents found in `FILE:` tags, in first-seen order
    #[inline]
    pub fn sources(&self) -> Vec<String> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.text.lines())
            .filter_map(|line| line.strip_prefix(SOURCE_TAG_PREFIX))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unique()
            .map(str::to_string)
            .collect()
    }
}
