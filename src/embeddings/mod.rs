// Embeddings module
// This module handles text segmentation and the embedding provider seam

pub mod chunking;
pub mod openai;

use async_trait::async_trait;

use crate::Result;

pub use chunking::{CharacterTextSplitter, Chunk, ChunkingConfig};
pub use openai::OpenAiEmbeddingClient;

/// Converts text into fixed-length vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts. The result is aligned by index with `texts` and has
    /// exactly the same length, or the call fails.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
