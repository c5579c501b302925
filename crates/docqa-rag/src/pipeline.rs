use std::sync::Arc;
use tracing::info;

use docqa_core::chunker::Chunker;
use docqa_core::config::Settings;
use docqa_core::retry::RetryPolicy;
use docqa_core::traits::{CompletionProvider, EmbeddingProvider, VectorCollection};
use docqa_core::Result;
use docqa_embed::embedder_from_settings;
use docqa_llm::completion_from_settings;
use docqa_vector::open_collection;

use crate::chatbot::Chatbot;
use crate::generator::Generator;
use crate::indexer::Indexer;
use crate::retriever::Retriever;

/// Indexer and chatbot wired to one embedder and one collection.
pub struct Pipeline {
    pub indexer: Indexer,
    pub chatbot: Chatbot,
}

impl Pipeline {
    pub fn assemble(
        settings: &Settings,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: Arc<dyn VectorCollection>,
        llm: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        let retry = RetryPolicy::from(&settings.retry);
        let indexer = Self::assemble_indexer(settings, Arc::clone(&embedder), Arc::clone(&collection))?;
        let retriever = Retriever::new(embedder, collection).with_k(settings.retrieval.k).with_retry(retry);
        let generator = Generator::from_settings(llm, &settings.generation).with_retry(retry);
        Ok(Self { indexer, chatbot: Chatbot::new(retriever, generator) })
    }

    pub fn assemble_indexer(
        settings: &Settings,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: Arc<dyn VectorCollection>,
    ) -> Result<Indexer> {
        Ok(Indexer::new(embedder, collection)
            .with_chunker(Chunker::from_settings(&settings.chunking)?)
            .with_retry(RetryPolicy::from(&settings.retry)))
    }

    /// The write path alone. Never touches the generation settings, so no
    /// language-model credentials are needed to ingest.
    pub async fn indexer_from_settings(settings: &Settings) -> Result<Indexer> {
        settings.validate()?;
        let (embedder, collection) = open_shared(settings).await?;
        info!(embedder = embedder.embedder_id(), collection = collection.name(), "indexer ready");
        Self::assemble_indexer(settings, embedder, collection)
    }

    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let (embedder, collection) = open_shared(settings).await?;
        let llm = completion_from_settings(&settings.generation)?;
        info!(embedder = embedder.embedder_id(), collection = collection.name(), "pipeline ready");
        Self::assemble(settings, embedder, collection, llm)
    }
}

async fn open_shared(settings: &Settings) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn VectorCollection>)> {
    let embedder = embedder_from_settings(&settings.embedding)?;
    let collection = open_collection(&settings.store, embedder.dim()).await?;
    Ok((embedder, collection))
}
