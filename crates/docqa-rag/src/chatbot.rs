use docqa_core::config::Settings;
use docqa_core::Result;

use crate::generator::Generator;
use crate::pipeline::Pipeline;
use crate::retriever::Retriever;

/// Question in, answer out. Errors from either stage pass through as-is.
pub struct Chatbot {
    retriever: Retriever,
    generator: Generator,
}

impl Chatbot {
    pub fn new(retriever: Retriever, generator: Generator) -> Self { Self { retriever, generator } }

    pub async fn from_settings(settings: &Settings) -> Result<Self> { Ok(Pipeline::from_settings(settings).await?.chatbot) }

    pub fn retriever(&self) -> &Retriever { &self.retriever }

    pub async fn answer(&self, question: &str) -> Result<String> {
        let results = self.retriever.retrieve(question).await?;
        self.generator.generate(&results, question).await
    }
}
