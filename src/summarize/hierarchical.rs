//! Hierarchical summarization over a list of chunk texts.

use super::{HybridSummarizer, Summarizer};
use crate::Result;

/// Produces an extractive summary per chunk, joins them with newlines, and
/// passes the concatenation through [`HybridSummarizer`]. Used to build an
/// artifact-level [`crate::core::Overview`] when no verbatim source (such
/// as a README) is available.
pub struct HierarchicalSummarizer {
    per_chunk_extractive: super::ExtractiveSummarizer,
    hybrid: HybridSummarizer,
}

impl HierarchicalSummarizer {
    /// Builds a hierarchical summarizer from its per-chunk extractive stage
    /// and its final hybrid stage.
    #[must_use]
    pub const fn new(per_chunk_extractive: super::ExtractiveSummarizer, hybrid: HybridSummarizer) -> Self {
        Self {
            per_chunk_extractive,
            hybrid,
        }
    }

    /// Summarizes a list of chunk texts: extractive-summarize each one
    /// independently, join with newlines, then run the joined text through
    /// the hybrid summarizer.
    ///
    /// # Errors
    ///
    /// Returns an error only if an underlying stage's `Result` signature is
    /// exercised by a caller-supplied backend; the built-in stages never
    /// fail in practice (see [`super::AbstractiveSummarizer`]).
    pub fn summarize_chunks(&self, chunk_texts: &[String]) -> Result<String> {
        if chunk_texts.is_empty() {
            return Ok(String::new());
        }

        let mut per_chunk_summaries = Vec::with_capacity(chunk_texts.len());
        for chunk_text in chunk_texts {
            per_chunk_summaries.push(self.per_chunk_extractive.summarize(chunk_text)?);
        }

        let joined = per_chunk_summaries.join("\n");
        self.hybrid.summarize(&joined)
    }
}

impl Summarizer for HierarchicalSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        self.summarize_chunks(std::slice::from_ref(&text.to_string()))
    }
}
