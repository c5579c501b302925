//! BGE-M3 embeddings computed in-process with candle.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use docqa_core::traits::EmbeddingProvider;
use docqa_core::types::Embedding;
use docqa_core::Error;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

pub const LOCAL_EMBEDDING_DIM: usize = 1024;
const MAX_TOKENS: usize = 512;
const BATCH_SIZE: usize = 16;

pub struct LocalEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
}

impl LocalEmbedder {
    /// Loads the model from the first directory found by [`resolve_model_dir`].
    pub fn load() -> Result<Self> { Self::from_dir(&resolve_model_dir()?) }

    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let safetensors = model_dir.join("model.safetensors");
        let weights: HashMap<String, Tensor> = if safetensors.exists() {
            candle_core::safetensors::load(&safetensors, &device)?
        } else {
            candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?.into_iter().collect()
        };
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("BGE-M3 model loaded");

        let id = format!("local:bge-m3:d{LOCAL_EMBEDDING_DIM}");
        Ok(Self { model, tokenizer, device, id })
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, batch, MAX_TOKENS, &self.device)?;
            let token_type_ids = input_ids.zeros_like()?;
            let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
            let pooled = masked_mean_l2(&hidden, &attention_mask)?;
            let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
            for row in &rows {
                if row.len() != LOCAL_EMBEDDING_DIM {
                    return Err(anyhow!("model produced {} dims, expected {}", row.len(), LOCAL_EMBEDDING_DIM));
                }
            }
            out.extend(rows);
        }
        debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "local embedding batch");
        Ok(out)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { LOCAL_EMBEDDING_DIM }

    async fn embed_batch(&self, texts: &[String]) -> docqa_core::Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_texts(texts).map_err(|e| Error::embedding(format!("{e:#}")))
    }
}

/// Looks for the model in `APP_MODEL_DIR`, `MODEL_DIR`, then `models/bge-m3`
/// relative to the working directory and its parent.
pub fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                return Ok(p);
            }
            warn!(var, dir = %dir, "model directory does not exist");
        }
    }
    for candidate in ["models/bge-m3", "../models/bge-m3"] {
        let p = Path::new(candidate);
        if p.exists() {
            return Ok(p.to_path_buf());
        }
    }
    Err(anyhow!("Could not locate BGE-M3 model directory"))
}
