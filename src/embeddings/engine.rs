// engine.rs — Candle BERT embedding engine with attention-mask-aware mean pooling.
//
// Loads all-MiniLM-L6-v2 from safetensors, generates 384-dim sentence embeddings.
// Uses mean pooling over non-padding tokens (not naive average, not CLS token).

use std::path::Path;

use anyhow::{bail, Context};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use crate::config;
use crate::embeddings::{EmbeddingProvider, TaskHint};
use crate::error::IngestError;

/// In-process embedding provider: holds the loaded model and tokenizer.
pub struct EmbeddingEngine {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dims: usize,
}

impl EmbeddingEngine {
    /// Load the model from a local directory containing model.safetensors,
    /// tokenizer.json, and config.json.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let device = Device::Cpu;

        let config_path = model_dir.join("config.json");
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .with_context(|| format!("parse {}", config_path.display()))?;

        log::info!(
            "Loading embedding model: hidden_size={}, layers={}, heads={}",
            config.hidden_size,
            config.num_hidden_layers,
            config.num_attention_heads,
        );

        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path.clone()], DType::F32, &device)
                .with_context(|| format!("load weights from {}", weights_path.display()))?
        };

        let model = BertModel::load(vb, &config).context("load BERT model")?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        // The shipped tokenizer.json truncates at 128; overlong input must fail in `embed` instead.
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("disable truncation: {e}"))?;
        tokenizer.with_padding(None);

        log::info!("Embedding model loaded successfully (dims={})", config.hidden_size);

        Ok(Self {
            model,
            tokenizer,
            device,
            dims: config.hidden_size,
        })
    }

    /// Generate a sentence embedding for the given text.
    pub fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let token_ids = encoding.get_ids();
        let attention_mask = encoding.get_attention_mask();

        let max_len = config::embedding::LOCAL_MAX_TOKENS;
        if token_ids.len() > max_len {
            bail!(
                "input is {} tokens, {} accepts at most {}; lower CHUNK_SIZE_TOKENS",
                token_ids.len(),
                config::embedding::LOCAL_MODEL_NAME,
                max_len
            );
        }

        // [1, seq_len]
        let token_ids_t = Tensor::new(
            token_ids.iter().map(|&id| id as i64).collect::<Vec<_>>().as_slice(),
            &self.device,
        )?
        .unsqueeze(0)?;

        let attention_mask_t = Tensor::new(
            attention_mask.iter().map(|&m| m as i64).collect::<Vec<_>>().as_slice(),
            &self.device,
        )?
        .unsqueeze(0)?;

        let token_type_ids = token_ids_t.zeros_like()?;

        // [1, seq_len, hidden_size]
        let output = self
            .model
            .forward(&token_ids_t, &token_type_ids, Some(&attention_mask_t))?;

        let embedding = mean_pooling(&output, &attention_mask_t)?;
        let embedding = l2_normalize(&embedding)?;
        let emb_vec: Vec<f32> = embedding.squeeze(0)?.to_vec1()?;

        if emb_vec.len() != self.dims {
            bail!("unexpected embedding dims: got {}, expected {}", emb_vec.len(), self.dims);
        }

        Ok(emb_vec)
    }
}

impl EmbeddingProvider for EmbeddingEngine {
    fn name(&self) -> &str {
        config::embedding::LOCAL_MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn embed_batch(&self, texts: &[String], hint: TaskHint) -> Result<Vec<Vec<f32>>, IngestError> {
        // One forward pass per text; candle batching with variable lengths needs padding we don't need here.
        texts
            .iter()
            .map(|t| {
                self.embed(&format!("{}{}", hint.prefix(), t))
                    .map_err(|e| IngestError::Provider(format!("{e:#}")))
            })
            .collect()
    }
}

/// Attention-mask-aware mean pooling.
///
/// input_embeds: [batch, seq_len, hidden_size]
/// attention_mask: [batch, seq_len] (1 for real tokens, 0 for padding)
/// output: [batch, hidden_size]
fn mean_pooling(input_embeds: &Tensor, attention_mask: &Tensor) -> anyhow::Result<Tensor> {
    let mask_expanded = attention_mask
        .to_dtype(DType::F32)?
        .unsqueeze(2)?
        .broadcast_as(input_embeds.shape())?;

    let sum_embeddings = (input_embeds * &mask_expanded)?.sum(1)?;

    // Clamp to avoid div by zero.
    let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

    Ok((sum_embeddings / sum_mask)?)
}

/// L2 normalize a tensor along the last dimension.
fn l2_normalize(tensor: &Tensor) -> anyhow::Result<Tensor> {
    let norm = tensor.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norm = norm.clamp(1e-12, f64::MAX)?;
    Ok(tensor.broadcast_div(&norm)?)
}
