//! Vector collections: LanceDB on disk, or in memory.

use std::sync::Arc;
use tracing::info;

use docqa_core::config::{StoreBackend, StoreSettings};
use docqa_core::traits::VectorCollection;
use docqa_core::Result;

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::{LanceCollection, LanceStore};
pub use memory::{MemoryCollection, MemoryStore};

/// Opens (creating if needed) the configured collection for vectors of width `dim`.
pub async fn open_collection(settings: &StoreSettings, dim: usize) -> Result<Arc<dyn VectorCollection>> {
    let collection: Arc<dyn VectorCollection> = match settings.backend {
        StoreBackend::Lance => {
            let uri = settings.resolved_uri();
            let store = LanceStore::open(&uri).await?;
            info!(uri = %uri.display(), collection = %settings.collection, dim, "opened lance collection");
            Arc::new(store.collection(&settings.collection, dim).await?)
        }
        StoreBackend::Memory => {
            info!(collection = %settings.collection, "using in-memory collection");
            Arc::new(MemoryStore::new().collection(&settings.collection)?)
        }
    };
    Ok(collection)
}
