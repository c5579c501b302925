#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docqa_core::traits::{CompletionProvider, EmbeddingProvider, VectorCollection};
use docqa_core::types::{CompletionRequest, Embedding, QueryResult, WriteBatch};
use docqa_core::{Error, Result};
use docqa_embed::FakeEmbedder;

/// Wraps the fake embedder, counting calls and optionally dropping vectors.
pub struct CountingEmbedder {
    inner: FakeEmbedder,
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<Vec<String>>>,
    shortfall: usize,
    failures_left: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            inner: FakeEmbedder::new(dim),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            shortfall: 0,
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Returns `n` fewer vectors than requested.
    pub fn short_by(mut self, n: usize) -> Self {
        self.shortfall = n;
        self
    }

    /// Fails the first `n` calls with a provider error.
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }

    fn dim(&self) -> usize { self.inner.dim() }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(texts.to_vec());
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::embedding("simulated outage").unavailable());
        }
        let mut out = self.inner.embed_batch(texts).await?;
        out.truncate(out.len().saturating_sub(self.shortfall));
        Ok(out)
    }
}

/// Records every request and answers with a canned string.
pub struct RecordingLlm {
    pub requests: Mutex<Vec<CompletionRequest>>,
    answer: String,
}

impl RecordingLlm {
    pub fn new(answer: &str) -> Self { Self { requests: Mutex::new(Vec::new()), answer: answer.to_string() } }

    pub fn requests(&self) -> Vec<CompletionRequest> { self.requests.lock().unwrap().clone() }
}

#[async_trait]
impl CompletionProvider for RecordingLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.answer.clone())
    }
}

/// Counts writes and answers queries with misaligned sequences.
#[derive(Default)]
pub struct MalformedCollection {
    pub adds: AtomicUsize,
}

#[async_trait]
impl VectorCollection for MalformedCollection {
    fn name(&self) -> &str { "malformed" }

    async fn add(&self, _batch: &WriteBatch) -> Result<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query(&self, _embedding: &[f32], _k: usize) -> Result<QueryResult> {
        Ok(QueryResult {
            ids: vec!["a_0".into(), "a_1".into()],
            documents: vec!["one".into(), "two".into()],
            metadatas: vec![Default::default()],
            distances: vec![0.1, 0.2],
        })
    }

    async fn count(&self) -> Result<usize> { Ok(self.adds.load(Ordering::SeqCst)) }
}

pub fn shared<T>(value: T) -> Arc<T> { Arc::new(value) }
