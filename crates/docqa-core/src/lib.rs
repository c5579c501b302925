//! Domain types, collaborator traits and shared plumbing for the docqa pipeline.

pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, Result};
