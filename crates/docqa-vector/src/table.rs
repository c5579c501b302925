//! LanceDB connection and housekeeping helpers.

use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection, Table};
use std::sync::Arc;
use tracing::info;

use docqa_core::{Error, Result};

use crate::schema::vector_dim;

pub(crate) fn store_err(e: impl std::fmt::Display) -> Error { Error::store(e) }

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(store_err)
}

/// Creates an empty table with `schema` unless one named `name` already exists.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    let names = conn.table_names().execute().await.map_err(store_err)?;
    if names.iter().any(|n| n == name) {
        return Ok(());
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await.map_err(store_err)?;
    info!(table = name, "created collection table");
    Ok(())
}

/// Embedding width of an existing table.
pub async fn table_dim(table: &Table) -> Result<usize> {
    let schema = table.schema().await.map_err(store_err)?;
    vector_dim(&schema).ok_or_else(|| Error::store(format!("table '{}' has no fixed-size vector column", table.name())))
}
