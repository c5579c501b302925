use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

use docqa_core::config::EmbeddingSettings;
use docqa_core::traits::EmbeddingProvider;
use docqa_core::types::Embedding;
use docqa_core::error::is_retryable_status;
use docqa_core::{Error, Result};

/// Embeddings over an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dim: usize,
    id: String,
}

impl OpenAiEmbedder {
    /// Builds the provider, reading the API key from `settings.api_key_env`.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = env::var(&settings.api_key_env)
            .map_err(|_| Error::config(format!("{} not set", settings.api_key_env)))?;
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &EmbeddingSettings, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::config(format!("{} is empty", settings.api_key_env)));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            dim: settings.dim,
            id: format!("openai:{}", settings.model),
        })
    }

    pub fn model(&self) -> &str { &self.model }
}

/// Request payload for the embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Orders the returned vectors by their `index`, which is the position of
/// the matching input.
fn into_ordered(mut response: EmbeddingResponse) -> Vec<Embedding> {
    response.data.sort_by_key(|item| item.index);
    response.data.into_iter().map(|item| item.embedding).collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest { model: &self.model, input: texts };
        debug!(model = %self.model, inputs = texts.len(), "requesting embeddings");

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                Error::embedding(format!("request failed: {err}")).unavailable_if(err.is_timeout() || err.is_connect())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(status_error(status, &body));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| Error::embedding(format!("failed to parse response: {err}")))?;
        Ok(into_ordered(parsed))
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    Error::embedding(format!("API error {status}: {body}")).unavailable_if(is_retryable_status(status.as_u16()))
}
