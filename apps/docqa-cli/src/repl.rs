//! Line-oriented chat loop.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use docqa_rag::Chatbot;

/// Sentinel that ends a session.
pub const EXIT_SENTINEL: &str = "Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Exit,
    Empty,
    Question(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => ReplInput::Empty,
            EXIT_SENTINEL | "/quit" => ReplInput::Exit,
            q => ReplInput::Question(q.to_string()),
        }
    }
}

/// Reads questions from `input` until the sentinel or EOF. A failed answer
/// is reported and the session continues.
pub async fn run<R, W>(chatbot: &Chatbot, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            return Ok(());
        };
        writeln!(out, "User: {}", line.trim())?;
        match ReplInput::parse(&line) {
            ReplInput::Exit => return Ok(()),
            ReplInput::Empty => continue,
            ReplInput::Question(q) => match chatbot.answer(&q).await {
                Ok(answer) => writeln!(out, "Chatbot: {answer}")?,
                Err(err) => {
                    warn!(kind = ?err.kind(), error = %err, "question failed");
                    writeln!(out, "Error: {err}")?;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_core::traits::{CompletionProvider, EmbeddingProvider, VectorCollection};
    use docqa_core::types::CompletionRequest;
    use docqa_embed::FakeEmbedder;
    use docqa_rag::{Generator, Indexer, Retriever};
    use docqa_vector::MemoryCollection;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        async fn complete(&self, request: &CompletionRequest) -> docqa_core::Result<String> {
            Ok(format!("{} messages", request.messages.len()))
        }
    }

    async fn chatbot(with_docs: bool) -> Chatbot {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(FakeEmbedder::new(32));
        let coll: Arc<dyn VectorCollection> = Arc::new(MemoryCollection::new("documents"));
        if with_docs {
            Indexer::new(embedder.clone(), coll.clone()).ingest_text("a.txt", "a.txt", "tides are high").await.unwrap();
        }
        Chatbot::new(Retriever::new(embedder, coll), Generator::new(Arc::new(Echo), "m"))
    }

    #[test]
    fn parses_sentinels_and_questions() {
        assert_eq!(ReplInput::parse("Exit"), ReplInput::Exit);
        assert_eq!(ReplInput::parse("  /quit \n"), ReplInput::Exit);
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(ReplInput::parse("exit"), ReplInput::Question("exit".into()));
        assert_eq!(ReplInput::parse(" when is high tide?\n"), ReplInput::Question("when is high tide?".into()));
    }

    #[tokio::test]
    async fn answers_until_the_sentinel() {
        let bot = chatbot(true).await;
        let mut out = Vec::new();
        run(&bot, &b"when are tides high\n\nExit\nnever asked\n"[..], &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("User: when are tides high\nChatbot: 2 messages\n"));
        assert!(text.contains("User: Exit"));
        assert!(!text.contains("never asked"));
    }

    #[tokio::test]
    async fn errors_do_not_end_the_session() {
        let bot = chatbot(false).await;
        let mut out = Vec::new();
        run(&bot, &b"first\nsecond\n"[..], &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Error: Generation failed").count(), 2);
    }
}
