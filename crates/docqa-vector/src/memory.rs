//! In-process collections for tests and throwaway sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use docqa_core::traits::VectorCollection;
use docqa_core::types::{QueryResult, Record, WriteBatch};
use docqa_core::{Error, Result};

/// Squared Euclidean distance; ranking is identical to L2.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum() }

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Get-or-create. Handles to the same name share their rows.
    pub fn collection(&self, name: &str) -> Result<MemoryCollection> {
        let mut guard = self.collections.lock().map_err(|_| Error::store("memory store lock poisoned"))?;
        let coll = guard.entry(name.to_string()).or_insert_with(|| MemoryCollection::new(name));
        Ok(coll.clone())
    }
}

#[derive(Clone)]
pub struct MemoryCollection {
    name: String,
    rows: Arc<RwLock<Vec<Record>>>,
}

impl MemoryCollection {
    pub fn new(name: &str) -> Self { Self { name: name.to_string(), rows: Arc::new(RwLock::new(Vec::new())) } }

    pub fn records(&self) -> Result<Vec<Record>> {
        Ok(self.rows.read().map_err(|_| Error::store("memory collection lock poisoned"))?.clone())
    }
}

#[async_trait]
impl VectorCollection for MemoryCollection {
    fn name(&self) -> &str { &self.name }

    async fn add(&self, batch: &WriteBatch) -> Result<()> {
        let incoming = batch.clone().into_records()?;
        let mut rows = self.rows.write().map_err(|_| Error::store("memory collection lock poisoned"))?;
        if let Some(dim) = rows.first().map(|r| r.embedding.len()) {
            if let Some(bad) = incoming.iter().find(|r| r.embedding.len() != dim) {
                return Err(Error::store(format!(
                    "record '{}' has {} dims, collection expects {dim}",
                    bad.id,
                    bad.embedding.len()
                )));
            }
        }
        for record in incoming {
            match rows.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => rows.push(record),
            }
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<QueryResult> {
        let rows = self.rows.read().map_err(|_| Error::store("memory collection lock poisoned"))?;
        if let Some(dim) = rows.first().map(|r| r.embedding.len()) {
            if dim != embedding.len() {
                return Err(Error::store(format!("query vector has {} dims, collection expects {dim}", embedding.len())));
            }
        }
        let mut scored: Vec<(f32, &Record)> = rows.iter().map(|r| (squared_l2(embedding, &r.embedding), r)).collect();
        // stable: ties keep insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut out = QueryResult::default();
        for (distance, record) in scored.into_iter().take(k) {
            out.ids.push(record.id.clone());
            out.documents.push(record.text.clone());
            out.metadatas.push(record.metadata.clone());
            out.distances.push(distance);
        }
        Ok(out)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.rows.read().map_err(|_| Error::store("memory collection lock poisoned"))?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::types::ChunkMetadata;

    fn batch(items: &[(&str, [f32; 2])]) -> WriteBatch {
        WriteBatch::from_records(
            items
                .iter()
                .enumerate()
                .map(|(i, (id, v))| Record {
                    id: id.to_string(),
                    text: format!("text of {id}"),
                    embedding: v.to_vec(),
                    metadata: ChunkMetadata::new("doc", i, "docs/doc.txt"),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn nearest_first_and_truncated_to_k() {
        let coll = MemoryStore::new().collection("c").unwrap();
        coll.add(&batch(&[("far", [10.0, 0.0]), ("near", [1.0, 0.0]), ("mid", [3.0, 0.0])])).await.unwrap();
        let res = coll.query(&[0.0, 0.0], 2).await.unwrap();
        assert_eq!(res.ids, vec!["near", "mid"]);
        assert_eq!(res.distances, vec![1.0, 9.0]);
        assert_eq!(res.documents[0], "text of near");
    }

    #[tokio::test]
    async fn duplicate_id_overwrites() {
        let coll = MemoryCollection::new("c");
        coll.add(&batch(&[("a", [1.0, 1.0])])).await.unwrap();
        coll.add(&batch(&[("a", [2.0, 2.0])])).await.unwrap();
        assert_eq!(coll.count().await.unwrap(), 1);
        assert_eq!(coll.records().unwrap()[0].embedding, vec![2.0, 2.0]);
    }

    #[tokio::test]
    async fn handles_share_rows() {
        let store = MemoryStore::new();
        store.collection("c").unwrap().add(&batch(&[("a", [0.0, 0.0])])).await.unwrap();
        assert_eq!(store.collection("c").unwrap().count().await.unwrap(), 1);
        assert_eq!(store.collection("other").unwrap().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_width_query_is_rejected() {
        let coll = MemoryCollection::new("c");
        coll.add(&batch(&[("a", [0.0, 0.0])])).await.unwrap();
        let err = coll.query(&[0.0, 0.0, 0.0], 1).await.unwrap_err();
        assert_eq!(err.kind(), docqa_core::ErrorKind::Store);
    }

    #[tokio::test]
    async fn empty_collection_returns_nothing() {
        let coll = MemoryCollection::new("c");
        let res = coll.query(&[1.0], 3).await.unwrap();
        assert!(res.ids.is_empty());
    }
}
