// embedder.rs — Chunk a text field and embed every chunk.

use std::fmt;

use crate::config;
use crate::embeddings::chunker::{self, ChunkParams, TokenSpans};
use crate::embeddings::{EmbeddingProvider, TaskHint};
use crate::error::IngestError;

/// Which Patent text field a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkSource {
    Abstract,
    Summary,
}

impl ChunkSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkSource::Abstract => "abstract",
            ChunkSource::Summary => "summary",
        }
    }
}

impl fmt::Display for ChunkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic chunk id: `abstract_chunk_001`, `summary_chunk_012`, ...
/// `position` is 1-based. Retrying a record reproduces the same ids.
pub fn chunk_id(source: ChunkSource, position: usize) -> String {
    format!(
        "{}_chunk_{:0width$}",
        source.as_str(),
        position,
        width = config::chunking::CHUNK_ID_POSITION_WIDTH
    )
}

/// A chunk with its vector, ready to become an Evidence node.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk_id: String,
    pub source: ChunkSource,
    /// 1-based window index within `source`.
    pub position: usize,
    pub content: String,
    pub embedding: Vec<f32>,
}

pub struct ChunkEmbedder {
    provider: Box<dyn EmbeddingProvider>,
    tokenizer: Box<dyn TokenSpans>,
    params: ChunkParams,
    batch_size: usize,
}

impl ChunkEmbedder {
    pub fn new(
        provider: Box<dyn EmbeddingProvider>,
        tokenizer: Box<dyn TokenSpans>,
        params: ChunkParams,
        batch_size: usize,
    ) -> Self {
        Self {
            provider,
            tokenizer,
            params,
            batch_size: batch_size.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Split `text` with the configured window geometry and embed each chunk.
    pub fn embed_text(
        &self,
        text: Option<&str>,
        hint: TaskHint,
    ) -> Result<Vec<(String, Vec<f32>)>, IngestError> {
        self.embed(text, self.params.size(), self.params.overlap(), hint)
    }

    /// Split `text` into windows of `chunk_size_tokens` overlapping by
    /// `chunk_overlap_tokens` and embed each window.
    ///
    /// Results are in chunk order. Any provider failure or a vector of the
    /// wrong length fails the whole field.
    pub fn embed(
        &self,
        text: Option<&str>,
        chunk_size_tokens: usize,
        chunk_overlap_tokens: usize,
        hint: TaskHint,
    ) -> Result<Vec<(String, Vec<f32>)>, IngestError> {
        let params = ChunkParams::new(chunk_size_tokens, chunk_overlap_tokens)?;
        let texts: Vec<String> = chunker::split(text, self.tokenizer.as_ref(), params)?
            .into_iter()
            .map(|c| c.text)
            .collect();
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let dims = self.provider.dimensions();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let out = self.provider.embed_batch(batch, hint)?;
            if out.len() != batch.len() {
                return Err(IngestError::Provider(format!(
                    "{} returned {} vectors for {} chunks",
                    self.provider.name(),
                    out.len(),
                    batch.len()
                )));
            }
            if let Some(bad) = out.iter().find(|v| v.len() != dims) {
                return Err(IngestError::Provider(format!(
                    "{} returned a {}-dim vector, expected {}",
                    self.provider.name(),
                    bad.len(),
                    dims
                )));
            }
            vectors.extend(out);
        }

        Ok(texts.into_iter().zip(vectors).collect())
    }

    /// Embed one patent field as Evidence-ready chunks with deterministic ids.
    pub fn embed_field(
        &self,
        source: ChunkSource,
        text: Option<&str>,
    ) -> Result<Vec<EmbeddedChunk>, IngestError> {
        let pairs = self.embed_text(text, TaskHint::Document)?;
        log::debug!("{}: {} chunks", source, pairs.len());
        Ok(pairs
            .into_iter()
            .enumerate()
            .map(|(i, (content, embedding))| EmbeddedChunk {
                chunk_id: chunk_id(source, i + 1),
                source,
                position: i + 1,
                content,
                embedding,
            })
            .collect())
    }
}
