//! Recursive character splitting.
//!
//! Text is cut at the first separator in the priority list that occurs in it;
//! any piece still longer than the chunk size is cut again with the remaining
//! separators, down to single characters. Pieces are then packed greedily into
//! chunks, carrying a tail of the previous chunk forward as overlap.
//!
//! Separators stay attached to the end of the piece they terminate and chunks
//! are never trimmed, so every chunk is an exact slice of the input and the
//! input can be rebuilt by dropping each chunk's overlap.

use super::Chunk;
use crate::config::ChunkingSettings;
use crate::document::LoadedDocument;
use crate::error::{ColloquyError, Result};
use std::collections::VecDeque;

/// Splits text into chunks of at most `chunk_size` characters.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter with the default separators (paragraph, line, word, char).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ColloquyError::Config("chunk_size must be greater than 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(ColloquyError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: default_separators(),
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        let splitter = Self::new(settings.chunk_size, settings.chunk_overlap)?;
        if settings.separators.is_empty() {
            Ok(splitter)
        } else {
            Ok(splitter.with_separators(settings.separators.clone()))
        }
    }

    /// Replace the separator priority list.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text from `source`. Chunks carry no page number.
    pub fn split(&self, source: &str, text: &str) -> Vec<Chunk> {
        let mut pieces = Vec::new();
        self.collect_pieces(text, &self.separators, &mut pieces);
        self.merge(source, &pieces)
    }

    /// Split a loaded document, tagging each chunk with the page it starts on.
    pub fn split_document(&self, document: &LoadedDocument) -> Vec<Chunk> {
        let page_offsets = document.page_offsets();
        let mut chunks = self.split(&document.source, &document.full_text());

        for chunk in &mut chunks {
            let index = page_offsets
                .iter()
                .rposition(|&start| start <= chunk.offset)
                .unwrap_or(0);
            chunk.page = Some(index as u32 + 1);
        }
        chunks
    }

    fn collect_pieces<'a>(&self, text: &'a str, separators: &[String], out: &mut Vec<&'a str>) {
        if text.is_empty() {
            return;
        }
        if char_len(text) <= self.chunk_size {
            out.push(text);
            return;
        }

        let found = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s.as_str()));
        let Some(index) = found else {
            hard_cut(text, self.chunk_size, out);
            return;
        };
        let separator = separators[index].as_str();
        if separator.is_empty() {
            hard_cut(text, self.chunk_size, out);
            return;
        }

        let remaining = &separators[index + 1..];
        for piece in text.split_inclusive(separator) {
            if char_len(piece) <= self.chunk_size {
                out.push(piece);
            } else {
                self.collect_pieces(piece, remaining, out);
            }
        }
    }

    fn merge(&self, source: &str, pieces: &[&str]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        // (char offset, piece, char length)
        let mut window: VecDeque<(usize, &str, usize)> = VecDeque::new();
        let mut window_len = 0;
        let mut offset = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if window_len + len > self.chunk_size && !window.is_empty() {
                chunks.push(build_chunk(source, &window, chunks.len()));
                while window_len > self.chunk_overlap
                    || (window_len > 0 && window_len + len > self.chunk_size)
                {
                    match window.pop_front() {
                        Some((_, _, dropped)) => window_len -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((offset, piece, len));
            window_len += len;
            offset += len;
        }

        if !window.is_empty() {
            chunks.push(build_chunk(source, &window, chunks.len()));
        }
        chunks
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: default_separators(),
        }
    }
}

/// Paragraph, line, word, then character boundaries.
pub fn default_separators() -> Vec<String> {
    ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect()
}

fn build_chunk(source: &str, window: &VecDeque<(usize, &str, usize)>, order: usize) -> Chunk {
    let offset = window.front().map(|(o, _, _)| *o).unwrap_or(0);
    let text: String = window.iter().map(|(_, piece, _)| *piece).collect();
    Chunk {
        text,
        source: source.to_string(),
        page: None,
        offset,
        order,
    }
}

fn hard_cut<'a>(text: &'a str, size: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (index, _) in text.char_indices() {
        if count == size {
            out.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;

    /// Rebuild the input by dropping each chunk's overlap with its predecessor.
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut text = String::new();
        let mut end = 0;
        for chunk in chunks {
            let overlap = end - chunk.offset;
            text.extend(chunk.text.chars().skip(overlap));
            end = chunk.end();
        }
        text
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for p in 0..12 {
            for s in 0..6 {
                text.push_str(&format!("Paragraph {} sentence {} talks about résumé keywords. ", p, s));
            }
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(RecursiveSplitter::new(100, 100).is_err());
        assert!(RecursiveSplitter::new(0, 0).is_err());
        assert!(RecursiveSplitter::new(100, 99).is_ok());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = RecursiveSplitter::default().split("doc", "just a little text");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "just a little text");
        assert_eq!(chunks[0].offset, 0);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(RecursiveSplitter::default().split("doc", "").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let splitter = RecursiveSplitter::new(300, 60).unwrap();
        let text = sample_text();
        let chunks = splitter.split("doc", &text);

        assert!(chunks.len() > 3);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 300, "chunk of {} chars", chunk.char_len());
        }
        for pair in chunks.windows(2) {
            let overlap = pair[0].end() as isize - pair[1].offset as isize;
            assert!(overlap >= 0, "gap between chunks");
            assert!(overlap as usize <= 60);
            assert!(pair[1].offset > pair[0].offset);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_order_is_sequential() {
        let chunks = RecursiveSplitter::new(200, 20).unwrap().split("doc", &sample_text());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i);
        }
    }

    #[test]
    fn test_text_without_separators_is_hard_cut() {
        let text = "x".repeat(25);
        let splitter = RecursiveSplitter::new(10, 3).unwrap();
        let chunks = splitter.split("doc", &text);

        assert!(chunks.iter().all(|c| c.char_len() <= 10));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_multibyte_text_is_cut_on_char_boundaries() {
        let text = "é".repeat(37);
        let chunks = RecursiveSplitter::new(8, 2).unwrap().split("doc", &text);
        assert!(chunks.iter().all(|c| c.char_len() <= 8));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_custom_separators_without_fallback() {
        let splitter = RecursiveSplitter::new(10, 0)
            .unwrap()
            .with_separators(vec!["|".to_string()]);
        let chunks = splitter.split("doc", "aaaa|bbbb|cccccccccccccc|dd");
        assert!(chunks.iter().all(|c| c.char_len() <= 10));
        assert_eq!(reconstruct(&chunks), "aaaa|bbbb|cccccccccccccc|dd");
    }

    #[test]
    fn test_document_chunks_carry_start_page() {
        let pages = vec!["a".repeat(50), "b".repeat(50), "c".repeat(50)];
        let doc = LoadedDocument::from_pages("/tmp/resume.pdf", DocumentKind::Pdf, pages);
        let chunks = RecursiveSplitter::new(40, 0).unwrap().split_document(&doc);

        assert_eq!(chunks.first().unwrap().page, Some(1));
        assert_eq!(chunks.last().unwrap().page, Some(3));
        let b_chunk = chunks.iter().find(|c| c.text.starts_with('b')).unwrap();
        assert_eq!(b_chunk.page, Some(2));
        assert!(chunks.iter().all(|c| c.source == "/tmp/resume.pdf"));
        assert_eq!(chunks[0].label(), "resume.pdf p.1");
    }
}
