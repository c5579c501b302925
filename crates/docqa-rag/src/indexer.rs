use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use docqa_core::chunker::Chunker;
use docqa_core::extract::{discover_documents, source_name, FileExtractor};
use docqa_core::retry::RetryPolicy;
use docqa_core::traits::{EmbeddingProvider, TextExtractor, VectorCollection};
use docqa_core::types::{ChunkMetadata, Record, WriteBatch};
use docqa_core::{Error, Result};

/// Outcome of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub source: String,
    pub file_path: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
}

impl IngestReport {
    pub fn total_chunks(&self) -> usize { self.documents.iter().map(|d| d.chunks).sum() }
}

/// Progress notifications from [`Indexer::ingest_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestEvent<'a> {
    /// Number of documents found under the input paths.
    Discovered(usize),
    Started(&'a Path),
    Finished(&'a DocumentReport),
}

/// Write path: extract, chunk, embed once per document, store once per document.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    collection: Arc<dyn VectorCollection>,
    extractor: Arc<dyn TextExtractor>,
    chunker: Chunker,
    retry: RetryPolicy,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, collection: Arc<dyn VectorCollection>) -> Self {
        Self {
            embedder,
            collection,
            extractor: Arc::new(FileExtractor::new()),
            chunker: Chunker::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The populated collection, for handing to a retriever.
    pub fn collection(&self) -> Arc<dyn VectorCollection> { Arc::clone(&self.collection) }

    /// Ingests every supported document under `paths`, in path order. Stops
    /// at the first failing document; documents before it stay written.
    pub async fn ingest(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        self.ingest_with(paths, |_| {}).await
    }

    /// [`Indexer::ingest`], reporting each document to `progress` as it
    /// starts and as it finishes.
    pub async fn ingest_with<F>(&self, paths: &[PathBuf], mut progress: F) -> Result<IngestReport>
    where
        F: FnMut(IngestEvent<'_>),
    {
        let documents = discover_documents(paths)?;
        info!(documents = documents.len(), collection = self.collection.name(), "ingesting");
        progress(IngestEvent::Discovered(documents.len()));
        let mut report = IngestReport::default();
        for path in &documents {
            progress(IngestEvent::Started(path));
            let document = self.ingest_path(path).await?;
            progress(IngestEvent::Finished(&document));
            report.documents.push(document);
        }
        info!(documents = report.documents.len(), chunks = report.total_chunks(), "ingest complete");
        Ok(report)
    }

    pub async fn ingest_path(&self, path: &Path) -> Result<DocumentReport> {
        let extractor = Arc::clone(&self.extractor);
        let owned = path.to_path_buf();
        // PDF parsing is CPU-bound
        let text = tokio::task::spawn_blocking(move || extractor.extract(&owned))
            .await
            .map_err(|e| Error::extraction(path, e))??;
        self.ingest_text(&source_name(path), &path.to_string_lossy(), &text).await
    }

    /// Chunks, embeds and writes already-extracted `text`. Record ids are
    /// `"{source}_{i}"`, so a second document with the same name overwrites
    /// the first one's chunks.
    pub async fn ingest_text(&self, source: &str, file_path: &str, text: &str) -> Result<DocumentReport> {
        let chunks = self.chunker.split(text);
        let report = DocumentReport { source: source.to_string(), file_path: file_path.to_string(), chunks: chunks.len() };
        if chunks.is_empty() {
            debug!(source, "no text, nothing to write");
            return Ok(report);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.retry.run("embed document", || self.embedder.embed_batch(&texts)).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "provider returned {} embeddings for {} chunks of {source}",
                embeddings.len(),
                texts.len()
            )));
        }

        let records: Vec<Record> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Record {
                id: Record::id_for(source, chunk.index),
                metadata: ChunkMetadata::new(source, chunk.index, file_path),
                text: chunk.text,
                embedding,
            })
            .collect();
        let batch = WriteBatch::from_records(records);
        self.retry.run("store add", || self.collection.add(&batch)).await?;
        info!(source, chunks = report.chunks, "document indexed");
        Ok(report)
    }
}
