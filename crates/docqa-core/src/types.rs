//! Domain types shared by the ingestion and query paths.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type RecordId = String;
pub type Embedding = Vec<f32>;

/// A window of a document's extracted text.
///
/// `index` is the 0-based position among the chunks of the same document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Metadata stored next to every record.
///
/// Fields are optional because stores may hand back rows written by other
/// tools; records written by the indexer always fill all three.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: Option<String>,
    pub chunk: Option<usize>,
    pub file_path: Option<String>,
}

impl ChunkMetadata {
    pub fn new(source: &str, chunk: usize, file_path: &str) -> Self {
        Self { source: Some(source.to_string()), chunk: Some(chunk), file_path: Some(file_path.to_string()) }
    }
}

/// A persisted, embeddable unit.
///
/// - `id`: `"{source}_{chunk_index}"`, unique within a collection
/// - `text`: the chunk text
/// - `embedding`: vector produced by the collection's embedding provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub text: String,
    pub embedding: Embedding,
    pub metadata: ChunkMetadata,
}

impl Record {
    pub fn id_for(source: &str, chunk_index: usize) -> RecordId { format!("{source}_{chunk_index}") }
}

/// One row of a store write, split into the parallel sequences vector
/// stores expect. Position `i` of every sequence belongs to the same record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub ids: Vec<RecordId>,
    pub embeddings: Vec<Embedding>,
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
}

impl WriteBatch {
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut batch = WriteBatch {
            ids: Vec::with_capacity(records.len()),
            embeddings: Vec::with_capacity(records.len()),
            documents: Vec::with_capacity(records.len()),
            metadatas: Vec::with_capacity(records.len()),
        };
        for record in records {
            batch.ids.push(record.id);
            batch.embeddings.push(record.embedding);
            batch.documents.push(record.text);
            batch.metadatas.push(record.metadata);
        }
        batch
    }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn validate(&self) -> Result<()> {
        let n = self.ids.len();
        if self.embeddings.len() != n || self.documents.len() != n || self.metadatas.len() != n {
            return Err(Error::store(format!(
                "misaligned write: {} ids, {} embeddings, {} documents, {} metadatas",
                n,
                self.embeddings.len(),
                self.documents.len(),
                self.metadatas.len()
            )));
        }
        Ok(())
    }

    /// Zips the parallel sequences back into records.
    pub fn into_records(self) -> Result<Vec<Record>> {
        self.validate()?;
        Ok(self
            .ids
            .into_iter()
            .zip(self.embeddings)
            .zip(self.documents)
            .zip(self.metadatas)
            .map(|(((id, embedding), text), metadata)| Record { id, text, embedding, metadata })
            .collect())
    }
}

/// Raw nearest-neighbour answer from a store, nearest first.
///
/// `distances` follow the store's metric; lower is closer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<RecordId>,
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
}

/// A query hit reshaped for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub source: Option<String>,
    pub file_path: Option<String>,
    pub chunk: Option<usize>,
    pub score: f32,
}

impl RetrievalResult {
    /// Renders the whole record as it is handed to the language model.
    pub fn to_context(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.text.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self { Self { role: Role::System, content: content.into() } }

    pub fn user(content: impl Into<String>) -> Self { Self { role: Role::User, content: content.into() } }
}

/// A single chat-completion call: ordered messages, model and sampling temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}
