//! Retrieval-augmented chat
//!
//! [`RagChat`] turns a developer instruction and a user message into a
//! streamed answer. When a document is indexed the user message is replaced by
//! an augmented prompt built from the closest chunks. Any retrieval problem
//! downgrades the request to plain chat instead of failing it.

pub mod prompt;
pub mod session;


use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::Result;
use crate::chat::{ChatMessage, DeltaStream, LanguageModel};

pub use prompt::{assemble_context, augment_question};
pub use session::{DocumentSession, DocumentSummary, IndexedDocument, SessionStatus};

pub const DEFAULT_TOP_K: usize = 3;

/// How the user message was prepared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grounding {
    NoDocument,
    Grounded { chunks: usize },
    NoMatches,
    RetrievalFailed { reason: String },
}

impl Grounding {
    /// Short label for logs and response headers
    #[inline]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NoDocument => "none",
            Self::Grounded { .. } => "grounded",
            Self::NoMatches => "no-matches",
            Self::RetrievalFailed { .. } => "retrieval-failed",
        }
    }

    #[inline]
    pub const fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded { .. })
    }
}

impl fmt::Display for Grounding {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The exact two messages sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPrompt {
    pub messages: Vec<ChatMessage>,
    pub grounding: Grounding,
}

/// A streaming answer and how it was grounded
#[derive(Debug)]
pub struct AnswerStream {
    pub grounding: Grounding,
    pub deltas: DeltaStream,
}

pub struct RagChat {
    model: Arc<dyn LanguageModel>,
    top_k: usize,
}

impl fmt::Debug for RagChat {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagChat")
            .field("model", &self.model.model())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl RagChat {
    #[inline]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Build the system and user messages for one request
    #[inline]
    pub async fn prepare(
        &self,
        developer_message: &str,
        user_message: &str,
        document: Option<&IndexedDocument>,
    ) -> PreparedPrompt {
        let (user_content, grounding) = match document {
            None => (user_message.to_string(), Grounding::NoDocument),
            Some(document) => self.ground(document, user_message).await,
        };

        debug!("Prepared prompt with grounding {}", grounding);

        PreparedPrompt {
            messages: vec![
                ChatMessage::system(developer_message),
                ChatMessage::user(user_content),
            ],
            grounding,
        }
    }

    async fn ground(&self, document: &IndexedDocument, question: &str) -> (String, Grounding) {
        match document.search(question, self.top_k).await {
            Ok(hits) if hits.is_empty() => {
                debug!("No chunks of {} matched the question", document.file_name());
                (question.to_string(), Grounding::NoMatches)
            }
            Ok(hits) => {
                let context = assemble_context(&hits);
                info!(
                    "Grounding question in {} chunks of {}",
                    hits.len(),
                    document.file_name()
                );
                (
                    augment_question(&context, question),
                    Grounding::Grounded { chunks: hits.len() },
                )
            }
            Err(e) => {
                warn!(
                    "Retrieval against {} failed, answering without context: {}",
                    document.file_name(),
                    e
                );
                (
                    question.to_string(),
                    Grounding::RetrievalFailed {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// Start streaming an answer. Generation failures before the first delta
    /// are returned here.
    #[inline]
    pub async fn stream_answer(
        &self,
        developer_message: &str,
        user_message: &str,
        document: Option<&IndexedDocument>,
    ) -> Result<AnswerStream> {
        let prepared = self
            .prepare(developer_message, user_message, document)
            .await;
        let deltas = self.model.stream(&prepared.messages).await?;

        Ok(AnswerStream {
            grounding: prepared.grounding,
            deltas,
        })
    }

    /// Answer in one shot
    #[inline]
    pub async fn answer(
        &self,
        developer_message: &str,
        user_message: &str,
        document: Option<&IndexedDocument>,
    ) -> Result<(String, Grounding)> {
        let prepared = self
            .prepare(developer_message, user_message, document)
            .await;
        let text = self.model.complete_text(&prepared.messages).await?;
        Ok((text, prepared.grounding))
    }
}
