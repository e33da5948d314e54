// Search module
// Similarity ranking over the document index and context assembly for answers

pub mod context;
pub mod index;
pub mod ranking;

pub use context::{DEFAULT_MAX_CONTEXT_LENGTH, assemble_context};
pub use index::{DocumentIndex, IndexedChunk};
pub use ranking::{SIMILARITY_THRESHOLD, ScoredChunk, cosine_similarity, find_most_relevant_chunks};
