//! Persistent collections backed by LanceDB tables.

use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use docqa_core::traits::VectorCollection;
use docqa_core::types::{ChunkMetadata, QueryResult, WriteBatch};
use docqa_core::{Error, Result};

use crate::schema::build_record_schema;
use crate::table::{ensure_table, open_db, store_err, table_dim};

pub struct LanceStore {
    conn: Connection,
}

impl LanceStore {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(store_err)?;
        }
        let conn = open_db(path.to_string_lossy().as_ref()).await?;
        Ok(Self { conn })
    }

    /// Get-or-create the collection `name`. An existing table must store
    /// vectors of width `dim`; a different width means a different embedding
    /// model and is rejected.
    pub async fn collection(&self, name: &str, dim: usize) -> Result<LanceCollection> {
        ensure_table(&self.conn, name, build_record_schema(dim)).await?;
        let table = self.conn.open_table(name).execute().await.map_err(store_err)?;
        let stored = table_dim(&table).await?;
        if stored != dim {
            return Err(Error::config(format!(
                "collection '{name}' stores {stored}-dim vectors but the embedding provider produces {dim}"
            )));
        }
        Ok(LanceCollection { table, name: name.to_string(), dim })
    }
}

pub struct LanceCollection {
    table: Table,
    name: String,
    dim: usize,
}

impl LanceCollection {
    pub fn dim(&self) -> usize { self.dim }

    fn to_record_batch(&self, batch: &WriteBatch) -> Result<RecordBatch> {
        let schema = build_record_schema(self.dim);
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(batch.len());
        for (id, embedding) in batch.ids.iter().zip(&batch.embeddings) {
            if embedding.len() != self.dim {
                return Err(Error::store(format!("record '{id}' has {} dims, collection expects {}", embedding.len(), self.dim)));
            }
            vectors.push(Some(embedding.iter().map(|&x| Some(x)).collect()));
        }
        let sources: Vec<Option<&str>> = batch.metadatas.iter().map(|m| m.source.as_deref()).collect();
        let chunks = batch
            .metadatas
            .iter()
            .map(|m| m.chunk.map(chunk_column_value).transpose())
            .collect::<Result<Vec<Option<i32>>>>()?;
        let paths: Vec<Option<&str>> = batch.metadatas.iter().map(|m| m.file_path.as_deref()).collect();
        RecordBatch::try_new(schema, vec![
            Arc::new(StringArray::from(batch.ids.clone())),
            Arc::new(StringArray::from(batch.documents.clone())),
            Arc::new(StringArray::from(sources)),
            Arc::new(Int32Array::from(chunks)),
            Arc::new(StringArray::from(paths)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, self.dim as i32)),
        ])
        .map_err(store_err)
    }
}

fn chunk_column_value(chunk: usize) -> Result<i32> {
    i32::try_from(chunk).map_err(|_| Error::store(format!("chunk index {chunk} does not fit the chunk column")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::store(format!("query result is missing column '{name}'")))
}

fn optional_string(col: &StringArray, i: usize) -> Option<String> {
    if col.is_null(i) { None } else { Some(col.value(i).to_string()) }
}

/// Appends one arrow batch of search hits onto `out`, keeping the row order.
fn append_hits(batch: &RecordBatch, out: &mut QueryResult) -> Result<()> {
    let ids = string_column(batch, "id")?;
    let texts = string_column(batch, "text")?;
    let sources = string_column(batch, "source")?;
    let paths = string_column(batch, "file_path")?;
    let chunks = batch
        .column_by_name("chunk")
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| Error::store("query result is missing column 'chunk'"))?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| Error::store("query result is missing column '_distance'"))?;
    for i in 0..batch.num_rows() {
        out.ids.push(ids.value(i).to_string());
        out.documents.push(texts.value(i).to_string());
        out.metadatas.push(ChunkMetadata {
            source: optional_string(sources, i),
            chunk: if chunks.is_null(i) { None } else { usize::try_from(chunks.value(i)).ok() },
            file_path: optional_string(paths, i),
        });
        out.distances.push(distances.value(i));
    }
    Ok(())
}

#[async_trait]
impl VectorCollection for LanceCollection {
    fn name(&self) -> &str { &self.name }

    async fn add(&self, batch: &WriteBatch) -> Result<()> {
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }
        let record_batch = self.to_record_batch(batch)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        // Upsert on id: re-ingesting a document overwrites its records.
        let mut merge = self.table.merge_insert(&["id"]);
        merge.when_matched_update_all(None).when_not_matched_insert_all();
        merge.execute(reader).await.map_err(store_err)?;
        debug!(collection = %self.name, rows = batch.len(), "wrote records");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<QueryResult> {
        let mut out = QueryResult::default();
        if k == 0 {
            return Ok(out);
        }
        if embedding.len() != self.dim {
            return Err(Error::store(format!("query vector has {} dims, collection expects {}", embedding.len(), self.dim)));
        }
        let mut stream = self
            .table
            .vector_search(embedding.to_vec())
            .map_err(store_err)?
            .limit(k)
            .execute()
            .await
            .map_err(store_err)?;
        while let Some(batch) = stream.try_next().await.map_err(store_err)? {
            append_hits(&batch, &mut out)?;
        }
        debug!(collection = %self.name, k, hits = out.ids.len(), "vector query");
        Ok(out)
    }

    async fn count(&self) -> Result<usize> { self.table.count_rows(None).await.map_err(store_err) }
}
