use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

/// Rate limiting and server-side failures; every other status is final.
pub fn is_retryable_status(status: u16) -> bool { status == 429 || (500..600).contains(&status) }

/// Coarse tag for an [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Extraction,
    EmbeddingProvider,
    Store,
    Retrieval,
    Generation,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to extract text from {}: {reason}", .path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("Embedding provider failed: {0}")]
    EmbeddingProvider(String),

    #[error("Vector store failed: {0}")]
    Store(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[source] Box<Error>),

    #[error("Generation failed: {0}")]
    Generation(String),

    /// A collaborator failure worth another attempt: rate limiting, a 5xx
    /// answer or a timeout. Reports the kind of the wrapped error.
    #[error(transparent)]
    Unavailable(Box<Error>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Extraction { .. } => ErrorKind::Extraction,
            Error::EmbeddingProvider(_) => ErrorKind::EmbeddingProvider,
            Error::Store(_) => ErrorKind::Store,
            Error::Retrieval(_) => ErrorKind::Retrieval,
            Error::Generation(_) => ErrorKind::Generation,
            Error::Unavailable(inner) => inner.kind(),
        }
    }

    /// Whether a collaborator call that failed this way may be attempted again.
    pub fn is_transient(&self) -> bool { matches!(self, Error::Unavailable(_)) }

    /// Marks the error as transient. Marking twice is a no-op.
    pub fn unavailable(self) -> Self {
        match self {
            Error::Unavailable(_) => self,
            other => Error::Unavailable(Box::new(other)),
        }
    }

    pub fn config(msg: impl Display) -> Self { Error::Configuration(msg.to_string()) }

    pub fn embedding(msg: impl Display) -> Self { Error::EmbeddingProvider(msg.to_string()) }

    pub fn store(msg: impl Display) -> Self { Error::Store(msg.to_string()) }

    pub fn generation(msg: impl Display) -> Self { Error::Generation(msg.to_string()) }

    pub fn extraction(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Error::Extraction { path: path.into(), reason: reason.to_string() }
    }

    /// Marks the error transient when `retryable` holds.
    pub fn unavailable_if(self, retryable: bool) -> Self {
        if retryable { self.unavailable() } else { self }
    }

    /// Tags a failure that happened while answering a query. Already-tagged
    /// errors pass through unchanged.
    pub fn retrieval(inner: Error) -> Self {
        match inner {
            Error::Retrieval(_) => inner,
            other => Error::Retrieval(Box::new(other)),
        }
    }
}
