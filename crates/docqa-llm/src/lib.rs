//! Chat-completion clients.

use std::sync::Arc;
use tracing::info;

use docqa_core::config::GenerationSettings;
use docqa_core::traits::CompletionProvider;
use docqa_core::Result;

pub mod openai;

pub use openai::OpenAiChat;

pub fn completion_from_settings(settings: &GenerationSettings) -> Result<Arc<dyn CompletionProvider>> {
    let chat = OpenAiChat::new(settings)?;
    info!(model = %settings.model, endpoint = %chat.endpoint(), "completion provider ready");
    Ok(Arc::new(chat))
}
