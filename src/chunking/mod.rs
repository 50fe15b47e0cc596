//! Splitting documents into overlapping, retrievable chunks.

mod recursive;

pub use recursive::RecursiveSplitter;

use serde::{Deserialize, Serialize};

/// A contiguous span of a document's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text of this chunk, copied verbatim from the source.
    pub text: String,
    /// Source document identifier.
    pub source: String,
    /// 1-based page the chunk starts on, when the source is paged.
    pub page: Option<u32>,
    /// Char offset of the first character in the joined document text.
    pub offset: usize,
    /// Order of this chunk within the document.
    pub order: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Char offset one past the last character.
    pub fn end(&self) -> usize {
        self.offset + self.char_len()
    }

    /// True when the chunk holds only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Short label for display, e.g. `resume.pdf p.2`.
    pub fn label(&self) -> String {
        let name = std::path::Path::new(&self.source)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.clone());
        match self.page {
            Some(page) => format!("{} p.{}", name, page),
            None => name,
        }
    }
}
