// ollama.rs — Embedding provider backed by an Ollama server (`POST /api/embed`).

use std::time::Duration;

use serde::Deserialize;

use crate::config;
use crate::embeddings::{EmbeddingProvider, TaskHint};
use crate::error::IngestError;

/// Connection settings for an Ollama embedding model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub model: String,
    pub base_url: String,
    pub embedding_dim: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: config::ollama::DEFAULT_MODEL.to_string(),
            base_url: config::ollama::DEFAULT_BASE_URL.to_string(),
            embedding_dim: config::ollama::DEFAULT_EMBEDDING_DIMS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

pub struct OllamaEmbedder {
    cfg: OllamaConfig,
    agent: ureq::Agent,
    url: String,
}

impl OllamaEmbedder {
    pub fn new(cfg: OllamaConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config::ollama::REQUEST_TIMEOUT_SECS))
            .build();
        let url = format!("{}{}", cfg.base_url.trim_end_matches('/'), config::ollama::EMBED_PATH);
        log::info!("Ollama embedder: model={} url={} dims={}", cfg.model, url, cfg.embedding_dim);
        Self { cfg, agent, url }
    }
}

impl EmbeddingProvider for OllamaEmbedder {
    fn name(&self) -> &str {
        &self.cfg.model
    }

    fn dimensions(&self) -> usize {
        self.cfg.embedding_dim
    }

    fn embed_batch(&self, texts: &[String], hint: TaskHint) -> Result<Vec<Vec<f32>>, IngestError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let input: Vec<String> = texts.iter().map(|t| format!("{}{}", hint.prefix(), t)).collect();
        let body = serde_json::json!({ "model": self.cfg.model, "input": input });

        log::debug!("POST {} ({} inputs, hint={:?})", self.url, texts.len(), hint);
        let resp = match self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
        {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                let detail = r.into_string().unwrap_or_default();
                return Err(IngestError::Provider(format!("HTTP {code} from {}: {}", self.url, detail.trim())));
            }
            Err(e) => return Err(IngestError::Provider(format!("request to {} failed: {e}", self.url))),
        };

        let parsed: EmbedResponse = serde_json::from_reader(resp.into_reader())
            .map_err(|e| IngestError::Provider(format!("invalid embed response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(IngestError::Provider(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}
