// settings.rs — Runtime settings: CLI flags with environment fallbacks, validated once at startup.
//
// Everything that can be wrong with the configuration is reported here as IngestError::Config,
// before any store connection or model load happens.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};

use crate::config;
use crate::embeddings::chunker::{ChunkParams, HfTokenizer, TokenSpans, WhitespaceTokens};
use crate::embeddings::embedder::ChunkEmbedder;
use crate::embeddings::engine::EmbeddingEngine;
use crate::embeddings::ollama::{OllamaConfig, OllamaEmbedder};
use crate::embeddings::{download, EmbeddingProvider};
use crate::error::IngestError;
use crate::graph::neo4j::{Neo4jConfig, Neo4jHttpStore};
use crate::graph::sqlite::SqliteGraphStore;
use crate::graph::GraphStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Neo4j,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    Ollama,
    Local,
}

#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// Graph store backend
    #[arg(long, env = "GRAPH_BACKEND", value_enum, default_value_t = Backend::Neo4j, global = true)]
    pub backend: Backend,

    /// Neo4j HTTP endpoint (http:// or https://)
    #[arg(long, env = "NEO4J_URI", default_value = config::neo4j::DEFAULT_URI, global = true)]
    pub neo4j_uri: String,

    #[arg(long, env = "NEO4J_USER", default_value = config::neo4j::DEFAULT_USER, global = true)]
    pub neo4j_user: String,

    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true, global = true)]
    pub neo4j_password: Option<String>,

    #[arg(long, env = "NEO4J_DATABASE", default_value = config::neo4j::DEFAULT_DATABASE, global = true)]
    pub neo4j_database: String,

    /// SQLite database file (sqlite backend)
    #[arg(long, env = "SQLITE_PATH", global = true)]
    pub sqlite_path: Option<PathBuf>,

    /// Embedding provider
    #[arg(long, env = "EMBEDDER", value_enum, default_value_t = EmbedderKind::Ollama, global = true)]
    pub embedder: EmbedderKind,

    #[arg(long, env = "OLLAMA_MODEL", default_value = config::ollama::DEFAULT_MODEL, global = true)]
    pub ollama_model: String,

    #[arg(long, env = "OLLAMA_BASE_URL", default_value = config::ollama::DEFAULT_BASE_URL, global = true)]
    pub ollama_base_url: String,

    /// Embedding dimension (defaults to the provider's native size)
    #[arg(long, env = "EMBEDDING_DIM", global = true)]
    pub embedding_dim: Option<usize>,

    /// HuggingFace tokenizer.json used to measure chunk windows
    #[arg(long, env = "TOKENIZER_PATH", global = true)]
    pub tokenizer_path: Option<PathBuf>,

    /// Count whitespace words instead of model tokens when no tokenizer is given
    #[arg(long, env = "APPROXIMATE_TOKENS", global = true)]
    pub approximate_tokens: bool,

    /// Window size (defaults: 500 for ollama, 200 for local)
    #[arg(long, env = "CHUNK_SIZE_TOKENS", global = true)]
    pub chunk_size_tokens: Option<usize>,

    #[arg(long, env = "CHUNK_OVERLAP_TOKENS", default_value_t = config::chunking::DEFAULT_CHUNK_OVERLAP_TOKENS, global = true)]
    pub chunk_overlap_tokens: usize,

    #[arg(long, env = "EMBED_BATCH_SIZE", default_value_t = config::embedding::DEFAULT_BATCH_SIZE, global = true)]
    pub embed_batch_size: usize,

    /// Directory holding the local model files (local embedder)
    #[arg(long, env = "MODEL_DIR", global = true)]
    pub model_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum StoreSettings {
    Neo4j(Neo4jConfig),
    Sqlite(PathBuf),
}

#[derive(Debug, Clone)]
pub enum ProviderSettings {
    Ollama(OllamaConfig),
    Local { model_dir: PathBuf },
}

/// Where chunk windows get their token boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerSource {
    File(PathBuf),
    /// The local model's own tokenizer.json.
    Model,
    Whitespace,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreSettings,
    pub provider: ProviderSettings,
    pub chunk: ChunkParams,
    pub batch_size: usize,
    pub tokenizer: TokenizerSource,
    pub dimensions: usize,
}

impl Settings {
    pub fn from_args(args: &SettingsArgs) -> Result<Self, IngestError> {
        let chunk_size = args.chunk_size_tokens.unwrap_or(match args.embedder {
            EmbedderKind::Ollama => config::chunking::DEFAULT_CHUNK_SIZE_TOKENS,
            EmbedderKind::Local => config::embedding::LOCAL_DEFAULT_CHUNK_SIZE_TOKENS,
        });
        let chunk = ChunkParams::new(chunk_size, args.chunk_overlap_tokens)?;
        if args.embed_batch_size == 0 {
            return Err(IngestError::Config("EMBED_BATCH_SIZE must be at least 1".into()));
        }

        let store = match args.backend {
            Backend::Neo4j => {
                let uri = args.neo4j_uri.trim();
                if !(uri.starts_with("http://") || uri.starts_with("https://")) {
                    return Err(IngestError::Config(format!(
                        "NEO4J_URI must be an http:// or https:// endpoint, got '{uri}'"
                    )));
                }
                let password = args
                    .neo4j_password
                    .clone()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| IngestError::Config("NEO4J_PASSWORD is required for the neo4j backend".into()))?;
                StoreSettings::Neo4j(Neo4jConfig {
                    uri: uri.to_string(),
                    user: args.neo4j_user.clone(),
                    password,
                    database: args.neo4j_database.clone(),
                })
            }
            Backend::Sqlite => StoreSettings::Sqlite(
                args.sqlite_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(config::sqlite::DEFAULT_DB_FILE)),
            ),
        };

        let (provider, dimensions) = match args.embedder {
            EmbedderKind::Ollama => {
                let dims = args.embedding_dim.unwrap_or(config::ollama::DEFAULT_EMBEDDING_DIMS);
                if dims == 0 {
                    return Err(IngestError::Config("EMBEDDING_DIM must be positive".into()));
                }
                let cfg = OllamaConfig {
                    model: args.ollama_model.clone(),
                    base_url: args.ollama_base_url.clone(),
                    embedding_dim: dims,
                };
                (ProviderSettings::Ollama(cfg), dims)
            }
            EmbedderKind::Local => {
                let dims = config::embedding::LOCAL_EMBEDDING_DIMS;
                if let Some(requested) = args.embedding_dim.filter(|d| *d != dims) {
                    return Err(IngestError::Config(format!(
                        "EMBEDDING_DIM={requested} but {} produces {dims}-dimensional vectors",
                        config::embedding::LOCAL_MODEL_NAME
                    )));
                }
                if chunk.size() > config::embedding::LOCAL_MAX_CHUNK_TOKENS {
                    return Err(IngestError::Config(format!(
                        "CHUNK_SIZE_TOKENS={} does not fit {}: at most {} tokens once the document prefix \
                         and special tokens are added",
                        chunk.size(),
                        config::embedding::LOCAL_MODEL_NAME,
                        config::embedding::LOCAL_MAX_CHUNK_TOKENS
                    )));
                }
                let model_dir = match &args.model_dir {
                    Some(dir) => dir.clone(),
                    None => download::default_model_dir().map_err(|e| IngestError::Config(format!("{e:#}")))?,
                };
                (ProviderSettings::Local { model_dir }, dims)
            }
        };

        let tokenizer = match (&args.tokenizer_path, &provider) {
            (Some(path), _) => TokenizerSource::File(path.clone()),
            (None, ProviderSettings::Local { .. }) => TokenizerSource::Model,
            (None, ProviderSettings::Ollama(_)) if args.approximate_tokens => TokenizerSource::Whitespace,
            (None, ProviderSettings::Ollama(cfg)) => {
                return Err(IngestError::Config(format!(
                    "TOKENIZER_PATH must point at the tokenizer.json of {} so chunks are measured in model \
                     tokens (or set APPROXIMATE_TOKENS to count whitespace words)",
                    cfg.model
                )))
            }
        };

        Ok(Self {
            store,
            provider,
            chunk,
            batch_size: args.embed_batch_size,
            tokenizer,
            dimensions,
        })
    }

    /// Open the configured store and make sure its schema fits `self.dimensions`.
    pub fn open_store(&self) -> anyhow::Result<Box<dyn GraphStore>> {
        let mut store: Box<dyn GraphStore> = match &self.store {
            StoreSettings::Neo4j(cfg) => Box::new(Neo4jHttpStore::new(cfg.clone())?),
            StoreSettings::Sqlite(path) => Box::new(SqliteGraphStore::open(path)?),
        };
        store
            .ensure_schema(self.dimensions)
            .with_context(|| format!("prepare {} schema", store.backend()))?;
        Ok(store)
    }

    pub fn build_embedder(&self) -> anyhow::Result<ChunkEmbedder> {
        let (provider, model_tokenizer): (Box<dyn EmbeddingProvider>, Option<PathBuf>) = match &self.provider {
            ProviderSettings::Ollama(cfg) => (Box::new(OllamaEmbedder::new(cfg.clone())), None),
            ProviderSettings::Local { model_dir } => {
                let dir = download::ensure_model_files(model_dir)?;
                let engine = EmbeddingEngine::load(&dir)?;
                if engine.dimensions() != self.dimensions {
                    anyhow::bail!(
                        "model at {} produces {} dims, expected {}",
                        dir.display(),
                        engine.dimensions(),
                        self.dimensions
                    );
                }
                (Box::new(engine), Some(dir.join("tokenizer.json")))
            }
        };

        let tokenizer = token_spans_for(&self.tokenizer, model_tokenizer.as_deref())?;
        Ok(ChunkEmbedder::new(provider, tokenizer, self.chunk, self.batch_size))
    }
}

fn token_spans_for(
    source: &TokenizerSource,
    model_tokenizer: Option<&Path>,
) -> anyhow::Result<Box<dyn TokenSpans>> {
    match (source, model_tokenizer) {
        (TokenizerSource::File(path), _) => Ok(Box::new(HfTokenizer::from_file(path)?)),
        (TokenizerSource::Model, Some(path)) => Ok(Box::new(HfTokenizer::from_file(path)?)),
        (TokenizerSource::Model, None) => anyhow::bail!("no model tokenizer available for this provider"),
        (TokenizerSource::Whitespace, _) => {
            log::warn!("APPROXIMATE_TOKENS set: chunk windows count whitespace words, not model tokens");
            Ok(Box::new(WhitespaceTokens))
        }
    }
}
