// Embeddings module
// Chunking of document text and the client for the hosted embedding service

pub mod chunking;
pub mod openai;

pub use chunking::{DEFAULT_CHUNK_SIZE, split_into_chunks};
pub use openai::EmbeddingClient;
