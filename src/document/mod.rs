//! Source document text extraction

#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::{RagError, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Detect the kind from the file extension
    #[inline]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Loads text units from PDF and plain-text files
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Extract the text units of the document at `path`.
    ///
    /// The result is never empty: a document that opens but contains no
    /// extractable characters is rejected the same way as one that cannot be
    /// opened at all.
    #[inline]
    pub fn load(&self, path: &Path) -> Result<Vec<String>> {
        if !path.is_file() {
            return Err(RagError::UnreadableDocument(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            RagError::UnreadableDocument(format!(
                "{} is not a supported document type",
                path.display()
            ))
        })?;

        debug!("Loading {:?} document from {}", kind, path.display());

        let text = match kind {
            DocumentKind::Pdf => extract_pdf(path)?,
            DocumentKind::PlainText => fs::read_to_string(path).map_err(|e| {
                RagError::UnreadableDocument(format!("failed to read {}: {}", path.display(), e))
            })?,
        };

        if text.trim().is_empty() {
            return Err(RagError::UnreadableDocument(format!(
                "could not extract text from {}",
                path.display()
            )));
        }

        info!(
            "Extracted {} characters from {}",
            text.chars().count(),
            path.display()
        );
        Ok(vec![text])
    }
}

fn extract_pdf(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| {
        RagError::UnreadableDocument(format!("failed to read {}: {}", path.display(), e))
    })?;

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(RagError::UnreadableDocument(format!(
            "{} is not a PDF file",
            path.display()
        )));
    }

    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        RagError::UnreadableDocument(format!(
            "failed to extract text from {}: {}",
            path.display(),
            e
        ))
    })
}
