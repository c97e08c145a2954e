//! The single live indexed document
//!
//! A [`DocumentSession`] holds at most one [`IndexedDocument`]. Documents are
//! built completely before they are published, so readers only ever see the
//! previous document, the new one, or none.


use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::DocumentLoader;
use crate::embeddings::{CharacterTextSplitter, EmbeddingProvider};
use crate::store::{SearchHit, VectorStore};
use crate::{RagError, Result};

/// Identity of an indexed document as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub file_name: String,
    pub indexed_at: DateTime<Utc>,
}

/// A document together with the vector store built from its chunks and the
/// embedder that must be used to query it.
pub struct IndexedDocument {
    id: Uuid,
    file_name: String,
    indexed_at: DateTime<Utc>,
    text: String,
    chunk_count: usize,
    store: VectorStore,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl fmt::Debug for IndexedDocument {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedDocument")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("indexed_at", &self.indexed_at)
            .field("chunk_count", &self.chunk_count)
            .field("entries", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl IndexedDocument {
    /// Load, chunk and embed the document at `path`.
    ///
    /// Text extraction runs on the blocking pool.
    #[inline]
    pub async fn build(
        path: &Path,
        file_name: &str,
        splitter: &CharacterTextSplitter,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let owned: PathBuf = path.to_path_buf();
        let units = tokio::task::spawn_blocking(move || DocumentLoader::new().load(&owned))
            .await
            .map_err(|e| RagError::Other(anyhow::anyhow!("document loading task failed: {}", e)))??;

        Self::from_texts(file_name, units, splitter, embedder).await
    }

    /// Chunk and embed already extracted text units
    #[inline]
    pub async fn from_texts(
        file_name: &str,
        units: Vec<String>,
        splitter: &CharacterTextSplitter,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let chunks = splitter.split_all(&units);
        if chunks.is_empty() {
            return Err(RagError::UnreadableDocument(
                "No text chunks could be created from the document".to_string(),
            ));
        }

        let chunk_count = chunks.len();
        let texts: Vec<String> = chunks.into_iter().map(|chunk| chunk.text).collect();
        debug!("Split {} into {} chunks", file_name, chunk_count);

        let store = VectorStore::build_from_texts(embedder.as_ref(), &texts).await?;

        let document = Self {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            indexed_at: Utc::now(),
            text: units.join("\n"),
            chunk_count,
            store,
            embedder,
        };

        info!(
            "Indexed {} as {} ({} chunks, {} entries)",
            document.file_name,
            document.id,
            document.chunk_count,
            document.store.len()
        );
        Ok(document)
    }

    /// Top `k` chunks for `query`
    #[inline]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        self.store
            .search_by_text(self.embedder.as_ref(), query, k)
            .await
    }

    #[inline]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            file_name: self.file_name.clone(),
            indexed_at: self.indexed_at,
        }
    }

    #[inline]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Extracted text the document was indexed from
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Chunks produced by the splitter, duplicates included
    #[inline]
    pub const fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    #[inline]
    pub const fn store(&self) -> &VectorStore {
        &self.store
    }
}

/// Snapshot of the session for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub pdf_uploaded: bool,
    pub chunks_count: usize,
    pub document: Option<DocumentSummary>,
}

/// Holds the one live document, if any
#[derive(Debug, Default)]
pub struct DocumentSession {
    current: RwLock<Option<Arc<IndexedDocument>>>,
}

impl DocumentSession {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current document. The lock is released before this returns.
    #[inline]
    pub async fn snapshot(&self) -> Option<Arc<IndexedDocument>> {
        self.current.read().await.clone()
    }

    /// Replace whatever is live with `document`
    #[inline]
    pub async fn publish(&self, document: IndexedDocument) -> Arc<IndexedDocument> {
        let document = Arc::new(document);
        let previous = self.current.write().await.replace(Arc::clone(&document));

        if let Some(previous) = previous {
            debug!("Replaced document {} with {}", previous.id, document.id);
        }
        document
    }

    /// Discard the live document; returns whether there was one
    #[inline]
    pub async fn clear(&self) -> bool {
        let previous = self.current.write().await.take();
        let Some(previous) = previous else {
            return false;
        };
        info!("Cleared document {}", previous.id);
        true
    }

    #[inline]
    pub async fn status(&self) -> SessionStatus {
        let Some(document) = self.snapshot().await else {
            return SessionStatus {
                pdf_uploaded: false,
                chunks_count: 0,
                document: None,
            };
        };

        SessionStatus {
            pdf_uploaded: true,
            chunks_count: document.store.len(),
            document: Some(document.summary()),
        }
    }
}
