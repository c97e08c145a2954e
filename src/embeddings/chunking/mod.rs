
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RagError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// A window of document text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk within the document
    pub index: usize,
    /// The chunk text, at most `chunk_size` characters
    pub text: String,
}

/// Configuration for content chunking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window width in characters
    pub chunk_size: usize,
    /// Characters shared between adjacent windows
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Fixed-width character windowing with overlap.
///
/// Chunk `i` starts at character offset `i * (chunk_size - chunk_overlap)` and
/// spans up to `chunk_size` characters. Splitting stops as soon as a window
/// reaches the end of the text, so the final chunk may be shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CharacterTextSplitter {
    #[inline]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    #[inline]
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    #[inline]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into overlapping chunks. Empty text yields no chunks.
    #[inline]
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(Chunk {
                index: chunks.len(),
                text: chars[start..end].iter().collect(),
            });

            if end == chars.len() {
                break;
            }
            start += step;
        }

        debug!(
            "Split {} characters into {} chunks (size {}, overlap {})",
            chars.len(),
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }

    /// Split every text unit and number the chunks across all of them
    #[inline]
    pub fn split_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for text in texts {
            for chunk in self.split(text.as_ref()) {
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: chunk.text,
                });
            }
        }
        chunks
    }
}

impl Default for CharacterTextSplitter {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}
