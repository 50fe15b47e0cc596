//! Source document loading.
//!
//! PDFs are read page by page with `lopdf`; plain text and markdown files are
//! read as a single page.

use crate::error::{ColloquyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// Separator used when pages are joined into one text.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Supported document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Text,
    Markdown,
}

impl DocumentKind {
    /// Detect the document type from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "txt" => Ok(DocumentKind::Text),
            "md" | "markdown" => Ok(DocumentKind::Markdown),
            _ => Err(ColloquyError::UnsupportedFile(path.display().to_string())),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Text => write!(f, "text"),
            DocumentKind::Markdown => write!(f, "markdown"),
        }
    }
}

/// A document's extracted text, one entry per page.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Identifier stored with every chunk (the resolved path).
    pub source: String,
    pub kind: DocumentKind,
    pub pages: Vec<String>,
}

impl LoadedDocument {
    /// Build a document from already extracted pages.
    pub fn from_pages(source: impl Into<String>, kind: DocumentKind, pages: Vec<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            pages,
        }
    }

    /// All pages joined with [`PAGE_SEPARATOR`].
    pub fn full_text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }

    /// True when no page has any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }

    /// Char offset where each page starts in [`full_text`](Self::full_text).
    pub fn page_offsets(&self) -> Vec<usize> {
        let separator_len = PAGE_SEPARATOR.chars().count();
        let mut offsets = Vec::with_capacity(self.pages.len());
        let mut offset = 0;
        for page in &self.pages {
            offsets.push(offset);
            offset += page.chars().count() + separator_len;
        }
        offsets
    }
}

/// Load a document from disk.
#[instrument]
pub fn load(path: &Path) -> Result<LoadedDocument> {
    if !path.exists() {
        return Err(ColloquyError::FileNotFound(path.display().to_string()));
    }
    let kind = DocumentKind::from_path(path)?;
    let source = std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();

    let pages = match kind {
        DocumentKind::Pdf => load_pdf_pages(path)?,
        DocumentKind::Text | DocumentKind::Markdown => vec![std::fs::read_to_string(path)?],
    };

    debug!("Loaded {} page(s) from {}", pages.len(), source);
    Ok(LoadedDocument::from_pages(source, kind, pages))
}

/// Extract text from every page of a PDF, in page order.
fn load_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let doc = lopdf::Document::load(path)?;
    doc.get_pages()
        .keys()
        .map(|&number| {
            doc.extract_text(&[number])
                .map_err(|e| ColloquyError::Pdf(format!("page {}: {}", number, e)))
        })
        .collect()
}
