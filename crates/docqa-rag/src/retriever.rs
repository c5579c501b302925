use std::sync::Arc;
use tracing::debug;

use docqa_core::retry::RetryPolicy;
use docqa_core::traits::{EmbeddingProvider, VectorCollection};
use docqa_core::types::{QueryResult, RetrievalResult};
use docqa_core::{Error, Result};

pub const DEFAULT_K: usize = 5;

/// Read path. Must share its embedding provider with the indexer that
/// filled the collection: vectors from different models do not compare.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    collection: Arc<dyn VectorCollection>,
    k: usize,
    retry: RetryPolicy,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, collection: Arc<dyn VectorCollection>) -> Self {
        Self { embedder, collection, k: DEFAULT_K, retry: RetryPolicy::default() }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn k(&self) -> usize { self.k }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievalResult>> { self.retrieve_k(question, self.k).await }

    /// At most `k` results, in the store's order (nearest first).
    pub async fn retrieve_k(&self, question: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        let input = [question.to_string()];
        let mut embeddings = self
            .retry
            .run("embed question", || self.embedder.embed_batch(&input))
            .await
            .map_err(Error::retrieval)?;
        let query = match (embeddings.pop(), embeddings.is_empty()) {
            (Some(v), true) => v,
            _ => return Err(Error::retrieval(Error::embedding("expected exactly one embedding for the question"))),
        };

        let raw = self.retry.run("store query", || self.collection.query(&query, k)).await.map_err(Error::retrieval)?;
        let results = shape_results(raw, k)?;
        debug!(k, hits = results.len(), "retrieved");
        Ok(results)
    }
}

/// Zips the store's parallel sequences into results. Unequal lengths mean
/// the store answered with a malformed result.
pub fn shape_results(raw: QueryResult, k: usize) -> Result<Vec<RetrievalResult>> {
    let n = raw.documents.len();
    if raw.metadatas.len() != n || raw.distances.len() != n {
        return Err(Error::retrieval(Error::store(format!(
            "malformed query result: {} documents, {} metadatas, {} distances",
            n,
            raw.metadatas.len(),
            raw.distances.len()
        ))));
    }
    let mut results: Vec<RetrievalResult> = raw
        .documents
        .into_iter()
        .zip(raw.metadatas)
        .zip(raw.distances)
        .map(|((text, meta), score)| RetrievalResult {
            text,
            source: meta.source,
            file_path: meta.file_path,
            chunk: meta.chunk,
            score,
        })
        .collect();
    results.truncate(k);
    Ok(results)
}
