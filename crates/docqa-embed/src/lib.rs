//! Embedding providers: OpenAI-compatible HTTP, local BGE-M3, and a
//! deterministic fake.
//!
//! Ingestion and retrieval must use the same provider instance (or at least
//! the same `embedder_id`); vectors from different models are not comparable.

use std::sync::Arc;
use tracing::info;

use docqa_core::config::{fake_embeddings_forced, EmbeddingBackend, EmbeddingSettings};
use docqa_core::traits::EmbeddingProvider;
use docqa_core::{Error, Result};

mod device;
pub mod fake;
pub mod local;
pub mod openai;
mod pool;
mod tokenize;

pub use fake::FakeEmbedder;
pub use local::LocalEmbedder;
pub use openai::OpenAiEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

/// Builds the configured provider. `APP_USE_FAKE_EMBEDDINGS=1` overrides the
/// configured backend with [`FakeEmbedder`].
pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let backend = if fake_embeddings_forced() { EmbeddingBackend::Fake } else { settings.provider };
    let provider: Arc<dyn EmbeddingProvider> = match backend {
        EmbeddingBackend::Fake => Arc::new(FakeEmbedder::new(settings.dim)),
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbedder::new(settings)?),
        EmbeddingBackend::Local => {
            Arc::new(LocalEmbedder::load().map_err(|e| Error::embedding(format!("failed to load local model: {e:#}")))?)
        }
    };
    info!(embedder = provider.embedder_id(), dim = provider.dim(), "embedding provider ready");
    Ok(provider)
}
