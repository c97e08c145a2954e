//! In-memory vector store with exact cosine similarity search

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use tracing::{debug, info};

use crate::embeddings::EmbeddingProvider;
use crate::{RagError, Result};

/// One retrieved passage
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

/// Text keys mapped to embedding vectors, kept in insertion order.
///
/// The first inserted vector fixes the store's dimension. Re-inserting an
/// existing key replaces its vector in place, so it keeps its original
/// position for tie-breaking.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    entries: Vec<(String, Vec<f32>)>,
    positions: HashMap<String, usize>,
    dimension: Option<usize>,
}

impl VectorStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed `texts` with one batched provider call and insert each under its
    /// own text. Either every text is stored or an error is returned and no
    /// store exists.
    #[inline]
    pub async fn build_from_texts(
        embedder: &dyn EmbeddingProvider,
        texts: &[String],
    ) -> Result<Self> {
        debug!("Building vector store from {} texts", texts.len());

        let vectors = embedder.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingProvider(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                vectors.len()
            )));
        }

        let mut store = Self::new();
        for (text, vector) in texts.iter().zip(vectors) {
            store.insert(text.clone(), vector)?;
        }

        info!(
            "Vector store built with {} entries of dimension {}",
            store.len(),
            store.dimension.unwrap_or(0)
        );
        Ok(store)
    }

    /// Insert or overwrite the vector stored under `key`
    #[inline]
    pub fn insert(&mut self, key: String, vector: Vec<f32>) -> Result<()> {
        match self.dimension {
            Some(expected) if vector.len() != expected => {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            None if vector.is_empty() => {
                return Err(RagError::DimensionMismatch {
                    expected: 1,
                    actual: 0,
                });
            }
            None => self.dimension = Some(vector.len()),
            Some(_) => {}
        }

        if let Some(&position) = self.positions.get(&key) {
            self.entries[position].1 = vector;
        } else {
            self.positions.insert(key.clone(), self.entries.len());
            self.entries.push((key, vector));
        }
        Ok(())
    }

    /// Top `k` entries by descending cosine similarity to `query`.
    ///
    /// Ties keep insertion order. `k == 0` returns nothing and `k` larger than
    /// the store returns every entry.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (_, vector))| (position, cosine_similarity(query, vector)))
            .collect();

        // `sort_by` is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                text: self.entries[position].0.clone(),
                score,
            })
            .collect())
    }

    /// Embed `query` and delegate to [`VectorStore::search`]
    #[inline]
    pub async fn search_by_text(
        &self,
        embedder: &dyn EmbeddingProvider,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let vector = embedder.embed(query).await?;
        self.search(&vector, k)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].1.as_slice())
    }

    /// Keys in insertion order
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub const fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

/// `(a · b) / (‖a‖ ‖b‖)`, or 0 when either norm is zero or the result is not
/// finite.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a * norm_b);
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
