//! Seams to the external collaborators of the pipeline.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CompletionRequest, Embedding, QueryResult, WriteBatch};

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-large`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// Embeds `texts` in one call. The output is order-preserving and the
    /// call fails as a whole rather than returning a partial set.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}

/// A named namespace of records inside a vector store.
#[async_trait]
pub trait VectorCollection: Send + Sync {
    fn name(&self) -> &str;
    /// Writes a batch; a duplicate id overwrites the stored record.
    async fn add(&self, batch: &WriteBatch) -> Result<()>;
    /// Returns up to `k` records nearest to `embedding`, nearest first.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<QueryResult>;
    async fn count(&self) -> Result<usize>;
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

pub trait TextExtractor: Send + Sync {
    /// Full text of the document at `path`, pages separated by newlines.
    fn extract(&self, path: &Path) -> Result<String>;
}
