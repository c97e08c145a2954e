use super::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Maps each text to a vector derived from its first byte
struct KeyedEmbedder {
    calls: AtomicUsize,
}

impl KeyedEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn vector_for(text: &str) -> Vec<f32> {
        match text.as_bytes().first() {
            Some(b'a') => vec![1.0, 0.0, 0.0],
            Some(b'b') => vec![0.0, 1.0, 0.0],
            Some(b'c') => vec![0.7, 0.7, 0.0],
            _ => vec![0.0, 0.0, 1.0],
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeyedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingProvider("service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::EmbeddingProvider("service unavailable".to_string()))
    }
}

/// Returns one vector fewer than requested
struct ShortEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn cosine_similarity_basics() {
    assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
}

#[test]
fn insert_overwrites_in_place() {
    let mut store = VectorStore::new();
    store.insert("first".to_string(), vec![1.0, 0.0]).expect("insert");
    store.insert("second".to_string(), vec![0.0, 1.0]).expect("insert");
    store.insert("first".to_string(), vec![0.5, 0.5]).expect("overwrite");

    assert_eq!(store.len(), 2);
    assert_eq!(store.get("first"), Some([0.5, 0.5].as_slice()));
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["first", "second"]);
}

#[test]
fn insert_rejects_other_dimensions() {
    let mut store = VectorStore::new();
    store.insert("a".to_string(), vec![1.0, 0.0]).expect("insert");

    let err = store
        .insert("b".to_string(), vec![1.0, 0.0, 0.0])
        .expect_err("wrong length");
    assert!(matches!(
        err,
        RagError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert_eq!(store.len(), 1);

    let mut empty = VectorStore::new();
    assert!(empty.insert("z".to_string(), Vec::new()).is_err());
    assert_eq!(empty.dimension(), None);
}

#[test]
fn search_orders_by_similarity() {
    let mut store = VectorStore::new();
    store.insert("x".to_string(), vec![0.0, 1.0]).expect("insert");
    store.insert("y".to_string(), vec![1.0, 0.0]).expect("insert");
    store.insert("z".to_string(), vec![1.0, 1.0]).expect("insert");

    let hits = store.search(&[1.0, 0.1], 3).expect("search");
    let order: Vec<_> = hits.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(order, vec!["y", "z", "x"]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn search_returns_at_most_k() {
    let mut store = VectorStore::new();
    for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
        store
            .insert((*key).to_string(), vec![1.0, i as f32])
            .expect("insert");
    }

    assert_eq!(store.search(&[1.0, 0.0], 2).expect("search").len(), 2);
    assert_eq!(store.search(&[1.0, 0.0], 10).expect("search").len(), 4);
    assert!(store.search(&[1.0, 0.0], 0).expect("search").is_empty());
}

#[test]
fn equal_scores_keep_insertion_order() {
    let mut store = VectorStore::new();
    store.insert("later".to_string(), vec![0.0, 1.0]).expect("insert");
    store.insert("tie-1".to_string(), vec![2.0, 0.0]).expect("insert");
    store.insert("tie-2".to_string(), vec![1.0, 0.0]).expect("insert");
    store.insert("tie-3".to_string(), vec![3.0, 0.0]).expect("insert");

    let hits = store.search(&[1.0, 0.0], 3).expect("search");
    let order: Vec<_> = hits.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(order, vec!["tie-1", "tie-2", "tie-3"]);
}

#[test]
fn zero_vectors_score_zero() {
    let mut store = VectorStore::new();
    store.insert("zero".to_string(), vec![0.0, 0.0]).expect("insert");
    store.insert("one".to_string(), vec![1.0, 0.0]).expect("insert");

    let hits = store.search(&[1.0, 0.0], 2).expect("search");
    assert_eq!(hits[0].text, "one");
    assert_eq!(hits[1].score, 0.0);

    let hits = store.search(&[0.0, 0.0], 2).expect("search");
    assert!(hits.iter().all(|h| h.score == 0.0));
}

#[test]
fn query_of_wrong_dimension_fails() {
    let mut store = VectorStore::new();
    store.insert("a".to_string(), vec![1.0, 0.0]).expect("insert");

    let err = store.search(&[1.0, 0.0, 0.0], 1).expect_err("mismatch");
    assert!(matches!(err, RagError::DimensionMismatch { .. }));
}

#[test]
fn empty_store_returns_nothing() {
    let store = VectorStore::new();
    assert!(store.is_empty());
    assert!(store.search(&[1.0, 2.0, 3.0], 3).expect("search").is_empty());
}

#[tokio::test]
async fn build_embeds_in_one_batch() {
    let embedder = KeyedEmbedder::new();
    let store = VectorStore::build_from_texts(&embedder, &texts(&["apple", "banana", "cherry"]))
        .await
        .expect("build");

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.len(), 3);
    assert_eq!(store.dimension(), Some(3));
}

#[tokio::test]
async fn build_collapses_duplicate_texts() {
    let embedder = KeyedEmbedder::new();
    let store = VectorStore::build_from_texts(&embedder, &texts(&["apple", "banana", "apple"]))
        .await
        .expect("build");

    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn failed_build_produces_no_store() {
    let result = VectorStore::build_from_texts(&FailingEmbedder, &texts(&["apple"])).await;
    assert!(matches!(result, Err(RagError::EmbeddingProvider(_))));

    let result = VectorStore::build_from_texts(&ShortEmbedder, &texts(&["a", "b"])).await;
    assert!(matches!(result, Err(RagError::EmbeddingProvider(_))));
}

#[tokio::test]
async fn search_by_text_embeds_the_query() {
    let embedder = KeyedEmbedder::new();
    let store = VectorStore::build_from_texts(&embedder, &texts(&["apple", "banana", "cherry"]))
        .await
        .expect("build");

    let hits = store
        .search_by_text(&embedder, "bread", 2)
        .await
        .expect("search");
    assert_eq!(hits[0].text, "banana");
    assert_eq!(hits[1].text, "cherry");
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn search_by_text_on_empty_store_skips_embedding() {
    let store = VectorStore::new();
    let hits = store
        .search_by_text(&FailingEmbedder, "anything", 3)
        .await
        .expect("no embedding call");
    assert!(hits.is_empty());
}
