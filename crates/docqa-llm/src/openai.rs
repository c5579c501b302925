use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::env;
use std::time::{Duration, Instant};
use tracing::debug;

use docqa_core::config::GenerationSettings;
use docqa_core::traits::CompletionProvider;
use docqa_core::types::CompletionRequest;
use docqa_core::error::is_retryable_status;
use docqa_core::{Error, Result};

/// Chat completions over an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: Client,
    api_base: String,
    api_key: String,
}

impl OpenAiChat {
    /// Reads the API key from `settings.api_key_env`.
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let api_key = env::var(&settings.api_key_env)
            .map_err(|_| Error::config(format!("{} not set", settings.api_key_env)))?;
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &GenerationSettings, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::config(format!("{} is empty", settings.api_key_env)));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_base: settings.api_base.trim_end_matches('/').to_string(), api_key })
    }

    pub fn endpoint(&self) -> String { format!("{}/chat/completions", self.api_base) }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Text of the first choice.
fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::generation("completion response has no content"))
}

#[async_trait]
impl CompletionProvider for OpenAiChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                Error::generation(format!("request failed: {err}")).unavailable_if(err.is_timeout() || err.is_connect())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(status_error(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| Error::generation(format!("failed to parse response: {err}")))?;
        let text = first_content(parsed)?;
        debug!(model = %request.model, elapsed_ms = start.elapsed().as_millis() as u64, chars = text.len(), "completion received");
        Ok(text)
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    Error::generation(format!("API error {status}: {body}")).unavailable_if(is_retryable_status(status.as_u16()))
}
