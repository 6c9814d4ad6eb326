//! Document chunker: word-level sliding windows over markdown sections.
//!
//! Mirrors the three-stage structure of the original document chunking
//! pipeline: strip YAML frontmatter, split on markdown headings, then
//! re-split any section longer than [`MAX_SECTION_WORDS`] on blank-line
//! paragraph boundaries before running the word-level sliding window.

use super::traits::{ChunkerConfig, Chunker};
use crate::core::Chunk;
use crate::error::{ChunkingError, Result};
use unicode_segmentation::UnicodeSegmentation;

/// Sections longer than this many words are re-split on blank lines before
/// windowing, so a single giant heading-delimited section doesn't collapse
/// into one enormous sliding-window pass.
pub const MAX_SECTION_WORDS: usize = 1_200;

/// Chunks markdown/plain-text documents into overlapping word windows.
#[derive(Debug, Clone)]
pub struct DocumentChunker {
    config: ChunkerConfig,
}

impl Default for DocumentChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentChunker {
    /// Creates a document chunker using [`ChunkerConfig::DOCUMENT_DEFAULT`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: ChunkerConfig::DOCUMENT_DEFAULT,
        }
    }

    /// Creates a document chunker with a custom configuration.
    #[must_use]
    pub const fn with_config(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Chunks a document's text content.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::EmptyContent`] if the document has no
    /// content left after frontmatter stripping, and
    /// [`ChunkingError::InvalidConfig`]/[`ChunkingError::OverlapTooLarge`]
    /// if the configuration is invalid.
    pub fn chunk(&self, document_id: &str, text: &str) -> Result<Vec<Chunk>> {
        self.validate(&self.config)?;

        let body = strip_frontmatter(text);
        if body.trim().is_empty() {
            return Err(ChunkingError::EmptyContent {
                source: document_id.to_string(),
            }
            .into());
        }

        let sections = split_on_headings(body);
        let mut blocks = Vec::new();
        for section in sections {
            if word_count(&section) > MAX_SECTION_WORDS {
                blocks.extend(split_on_blank_lines(&section));
            } else {
                blocks.push(section);
            }
        }

        let mut windows: Vec<String> = Vec::new();
        for block in &blocks {
            windows.extend(self.window_words(block));
        }
        if windows.is_empty() {
            return Err(ChunkingError::EmptyContent {
                source: document_id.to_string(),
            }
            .into());
        }

        let total = windows.len();
        let mut chunks = Vec::with_capacity(total);
        for (index, content) in windows.into_iter().enumerate() {
            let mut chunk = Chunk::for_document(document_id, content, index, total);
            if index > 0 && self.config.overlap > 0 {
                chunk.set_has_overlap(true);
            }
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    /// Splits a block of text into overlapping windows of `chunk_size`
    /// words with `overlap` words shared between consecutive windows.
    fn window_words(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }
        if words.len() <= self.config.chunk_size {
            return vec![text.trim().to_string()];
        }

        let step = self.config.chunk_size - self.config.overlap;
        let mut windows = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.config.chunk_size).min(words.len());
            windows.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            start += step;
        }
        windows
    }
}

impl Chunker for DocumentChunker {
    fn name(&self) -> &'static str {
        "document"
    }
}

/// Strips a leading `---\n...\n---` YAML frontmatter block, if present.
fn strip_frontmatter(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("---\n") else {
        return text;
    };
    rest.find("\n---\n").map_or(text, |end| &rest[end + 5..])
}

/// Splits on lines beginning with `#` (ATX-style headings), keeping each
/// heading with the content that follows it.
fn split_on_headings(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let is_heading = line.trim_start().starts_with('#');
        if is_heading && !current.trim().is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        sections.push(current);
    }
    if sections.is_empty() {
        sections.push(text.to_string());
    }
    sections
}

/// Splits a section on blank lines into paragraph-level blocks.
fn split_on_blank_lines(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_frontmatter_removes_block() {
        let text = "---\ntitle: x\n---\n# Heading\nbody";
        assert_eq!(strip_frontmatter(text), "# Heading\nbody");
    }

    #[test]
    fn test_strip_frontmatter_no_block() {
        let text = "# Heading\nbody";
        assert_eq!(strip_frontmatter(text), text);
    }

    #[test]
    fn test_chunk_short_document_single_chunk() {
        let chunker = DocumentChunker::new();
        let chunks = chunker.chunk("doc-1", "# Title\nShort body text.").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total_chunks, 1);
        assert_eq!(chunks[0].chunk_id, "doc-1_0");
    }

    #[test]
    fn test_chunk_empty_document_errors() {
        let chunker = DocumentChunker::new();
        let err = chunker.chunk("doc-1", "---\ntitle: x\n---\n").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_chunk_long_document_produces_overlap() {
        let chunker = DocumentChunker::with_config(ChunkerConfig::with_size_and_overlap(50, 10));
        let body = "word ".repeat(500);
        let chunks = chunker.chunk("doc-1", &body).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks[1].meta.has_overlap);
        assert!(!chunks[0].meta.has_overlap);
    }

    #[test]
    fn test_chunk_first_chunk_preserves_heading_marker() {
        let chunker = DocumentChunker::new();
        let body = format!("# Title\n{}", "word ".repeat(500));
        let chunks = chunker.chunk("doc-1", &body).unwrap();
        assert!(chunks[0].content.starts_with("# Title"));
    }

    #[test]
    fn test_split_on_headings_separates_sections() {
        let text = "# A\nalpha\n# B\nbeta\n";
        let sections = split_on_headings(text);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn test_split_on_blank_lines() {
        let text = "para one\n\npara two\n\npara three";
        let blocks = split_on_blank_lines(text);
        assert_eq!(blocks.len(), 3);
    }
}
