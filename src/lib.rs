use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Generation provider error: {0}")]
    GenerationProvider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<config::ConfigError> for RagError {
    #[inline]
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod rag;
pub mod server;
pub mod store;

#[cfg(feature = "bench")]
pub mod internal {
    pub use crate::embeddings::chunking;
    pub use crate::store;
}
