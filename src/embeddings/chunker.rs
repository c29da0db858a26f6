// chunker.rs — Overlapping token windows over a text field.
//
// Windows are measured in tokens of the embedding model's tokenizer, then mapped back to
// byte spans of the original text, so chunk text is always an exact substring of the input.

use std::ops::Range;
use std::path::Path;

use anyhow::Context;
use tokenizers::Tokenizer;

use crate::error::IngestError;

/// Anything that can split text into token byte spans.
pub trait TokenSpans {
    fn token_spans(&self, text: &str) -> Result<Vec<(usize, usize)>, IngestError>;
}

/// HuggingFace tokenizer loaded from a `tokenizer.json`.
pub struct HfTokenizer {
    inner: Tokenizer,
}

impl HfTokenizer {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let mut inner = Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("load tokenizer {}: {e}", path.display()))?;
        // Chunking needs every token of the field, not the model's context window.
        inner
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("disable truncation: {e}"))
            .context("configure tokenizer")?;
        inner.with_padding(None);
        log::info!("Loaded tokenizer from {}", path.display());
        Ok(Self { inner })
    }
}

impl TokenSpans for HfTokenizer {
    fn token_spans(&self, text: &str) -> Result<Vec<(usize, usize)>, IngestError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| IngestError::Provider(format!("tokenize: {e}")))?;
        Ok(encoding
            .get_offsets()
            .iter()
            .copied()
            .filter(|(start, end)| end > start)
            .collect())
    }
}

/// Whitespace-separated words as tokens. Used when no tokenizer file is
/// configured; counts only approximate the model's word-piece tokens.
pub struct WhitespaceTokens;

impl TokenSpans for WhitespaceTokens {
    fn token_spans(&self, text: &str) -> Result<Vec<(usize, usize)>, IngestError> {
        let mut spans = Vec::new();
        let mut start: Option<usize> = None;
        for (i, c) in text.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    spans.push((s, i));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push((s, text.len()));
        }
        Ok(spans)
    }
}

/// Validated window geometry: `overlap < size`, `size > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    size: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(size: usize, overlap: usize) -> Result<Self, IngestError> {
        if size == 0 {
            return Err(IngestError::Config("chunk size must be at least one token".into()));
        }
        if overlap >= size {
            return Err(IngestError::Config(format!(
                "chunk overlap ({overlap} tokens) must be smaller than chunk size ({size} tokens)"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.size - self.overlap
    }
}

/// One window of a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub tokens: Range<usize>,
}

/// Token ranges for `token_count` tokens. The last window ends exactly at the
/// final token; every window after the first starts `size - overlap` tokens
/// after its predecessor.
pub fn window_ranges(token_count: usize, params: ChunkParams) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    if token_count == 0 {
        return out;
    }
    let mut start = 0;
    loop {
        let end = (start + params.size).min(token_count);
        out.push(start..end);
        if end == token_count {
            break;
        }
        start += params.step();
    }
    out
}

/// Split `text` into overlapping token windows. `None`, empty and
/// whitespace-only text yield no chunks.
pub fn split(
    text: Option<&str>,
    tokenizer: &dyn TokenSpans,
    params: ChunkParams,
) -> Result<Vec<Chunk>, IngestError> {
    let Some(text) = text else { return Ok(vec![]) };
    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    let spans = tokenizer.token_spans(text)?;
    let chunks = window_ranges(spans.len(), params)
        .into_iter()
        .map(|range| {
            let byte_start = spans[range.start].0;
            let byte_end = spans[range.end - 1].1;
            Chunk {
                text: text[byte_start..byte_end].to_string(),
                tokens: range,
            }
        })
        .collect();
    Ok(chunks)
}
