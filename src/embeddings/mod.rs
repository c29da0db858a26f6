// embeddings/ — Token-window chunking and embedding providers.
//
// Provides:
// - Token windowing over a HuggingFace tokenizer (or whitespace fallback)
// - Ollama HTTP provider (batched /api/embed)
// - Local BERT provider on candle, with model download + SHA256 verification
// - ChunkEmbedder tying chunking and a provider together

pub mod chunker;
pub mod download;
pub mod embedder;
pub mod engine;
pub mod ollama;

use crate::config;
use crate::error::IngestError;

/// Biases the provider towards indexing or query-time representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskHint {
    Document,
    Query,
}

impl TaskHint {
    pub fn prefix(self) -> &'static str {
        match self {
            TaskHint::Document => config::embedding::DOCUMENT_PREFIX,
            TaskHint::Query => config::embedding::QUERY_PREFIX,
        }
    }
}

/// Text → vector service. Implementations must return exactly one vector per
/// input, in input order.
pub trait EmbeddingProvider {
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed_batch(&self, texts: &[String], hint: TaskHint) -> Result<Vec<Vec<f32>>, IngestError>;
}
