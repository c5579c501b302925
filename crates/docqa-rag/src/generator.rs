use std::sync::Arc;
use tracing::debug;

use docqa_core::config::{ContextStrategy, GenerationSettings};
use docqa_core::retry::RetryPolicy;
use docqa_core::traits::CompletionProvider;
use docqa_core::types::{ChatMessage, CompletionRequest, RetrievalResult};
use docqa_core::{Error, Result};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant trying to answer questions. \
Be honest about your limitations and don't be overly formal. Cite your sources.";

pub const PROMPT_TEMPLATE: &str = "You're a helpful assistant. Answer the question below.
If you don't know the answer, be honest and say you don't know.
Question: {question}
Context: {text}";

/// Fills the template with the question and the whole serialized result.
pub fn build_prompt(result: &RetrievalResult, question: &str) -> String {
    PROMPT_TEMPLATE.replace("{question}", question).replace("{text}", &result.to_context())
}

pub struct Generator {
    llm: Arc<dyn CompletionProvider>,
    model: String,
    temperature: f32,
    strategy: ContextStrategy,
    retry: RetryPolicy,
}

impl Generator {
    pub fn new(llm: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature: 0.0,
            strategy: ContextStrategy::Nearest,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_settings(llm: Arc<dyn CompletionProvider>, settings: &GenerationSettings) -> Self {
        Self::new(llm, settings.model.clone()).with_temperature(settings.temperature).with_strategy(settings.context)
    }

    pub fn with_strategy(mut self, strategy: ContextStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn strategy(&self) -> ContextStrategy { self.strategy }

    /// The single request sent for `results`: system instruction first, then
    /// the user prompt chosen by the context strategy.
    pub fn build_request(&self, results: &[RetrievalResult], question: &str) -> Result<CompletionRequest> {
        let user = match self.strategy {
            ContextStrategy::Nearest => results.first().map(|r| build_prompt(r, question)),
            ContextStrategy::Joined if results.is_empty() => None,
            ContextStrategy::Joined => {
                Some(results.iter().map(|r| build_prompt(r, question)).collect::<Vec<_>>().join("\n\n"))
            }
        }
        .ok_or_else(|| Error::generation("no retrieved context to answer from"))?;

        Ok(CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
            temperature: self.temperature,
        })
    }

    pub async fn generate(&self, results: &[RetrievalResult], question: &str) -> Result<String> {
        let request = self.build_request(results, question)?;
        debug!(model = %self.model, strategy = ?self.strategy, results = results.len(), "requesting completion");
        self.retry.run("complete", || self.llm.complete(&request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_core::types::Role;

    struct Unused;

    #[async_trait]
    impl CompletionProvider for Unused {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> { Ok(String::new()) }
    }

    fn result(text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            text: text.to_string(),
            source: Some("a.pdf".into()),
            file_path: Some("docs/a.pdf".into()),
            chunk: Some(0),
            score,
        }
    }

    #[test]
    fn prompt_carries_question_and_whole_record() {
        let prompt = build_prompt(&result("ferries run hourly", 0.1), "When do ferries run?");
        assert!(prompt.contains("Question: When do ferries run?"));
        assert!(prompt.contains("\"text\":\"ferries run hourly\""));
        assert!(prompt.contains("\"source\":\"a.pdf\""));
        assert!(prompt.contains("\"file_path\":\"docs/a.pdf\""));
    }

    #[test]
    fn nearest_sends_only_the_top_result() {
        let g = Generator::new(Arc::new(Unused), "gpt-4o");
        let req = g.build_request(&[result("first", 0.1), result("second", 0.2)], "q").unwrap();
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(req.messages[1].role, Role::User);
        assert!(req.messages[1].content.contains("first"));
        assert!(!req.messages[1].content.contains("second"));
        assert_eq!(req.temperature, 0.0);
        assert_eq!(req.model, "gpt-4o");
    }

    #[test]
    fn joined_sends_every_result_nearest_first() {
        let g = Generator::new(Arc::new(Unused), "gpt-4o").with_strategy(ContextStrategy::Joined);
        assert_eq!(g.strategy(), ContextStrategy::Joined);
        let req = g.build_request(&[result("first", 0.1), result("second", 0.2)], "q").unwrap();
        let user = &req.messages[1].content;
        let (a, b) = (user.find("first").unwrap(), user.find("second").unwrap());
        assert!(a < b);
    }

    #[test]
    fn no_context_is_a_generation_error() {
        for strategy in [ContextStrategy::Nearest, ContextStrategy::Joined] {
            let g = Generator::new(Arc::new(Unused), "m").with_strategy(strategy);
            let err = g.build_request(&[], "q").unwrap_err();
            assert_eq!(err.kind(), docqa_core::ErrorKind::Generation);
        }
    }
}
