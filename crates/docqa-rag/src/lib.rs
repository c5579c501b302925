//! Retrieval-augmented question answering over ingested documents.
//!
//! Write path: [`Indexer`] turns documents into records in a collection.
//! Query path: [`Retriever`] finds the nearest chunks, [`Generator`] asks
//! the language model, [`Chatbot`] composes the two.

pub mod chatbot;
pub mod generator;
pub mod indexer;
pub mod pipeline;
pub mod retriever;

pub use chatbot::Chatbot;
pub use generator::Generator;
pub use indexer::{DocumentReport, IngestEvent, IngestReport, Indexer};
pub use pipeline::Pipeline;
pub use retriever::Retriever;
