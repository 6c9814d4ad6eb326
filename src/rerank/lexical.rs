//! Deterministic lexical-overlap cross-encoder fallback.
//!
//! Used whenever no ONNX-backed reranker is compiled in, and directly by
//! the test suite so reranking behavior is assertable without a model
//! download. Scores a passage by the fraction of query words it contains
//! (case-insensitive, word-level), which is enough to produce a stable
//! ranking over retrieval-order candidates without claiming semantic
//! understanding.

use super::CrossEncoder;
use crate::Result;
use unicode_segmentation::UnicodeSegmentation;

/// Lexical-overlap cross-encoder: scores each passage by the fraction of
/// query words it contains.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalOverlapReranker;

impl LexicalOverlapReranker {
    /// Builds a new lexical-overlap reranker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn words(text: &str) -> std::collections::HashSet<String> {
        text.unicode_words().map(str::to_lowercase).collect()
    }
}

impl CrossEncoder for LexicalOverlapReranker {
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        let query_words = Self::words(query);
        if query_words.is_empty() {
            return Ok(vec![0.0; passages.len()]);
        }
        #[allow(clippy::cast_precision_loss)]
        let denom = query_words.len() as f32;
        Ok(passages
            .iter()
            .map(|passage| {
                let passage_words = Self::words(passage);
                let overlap = query_words.intersection(&passage_words).count();
                #[allow(clippy::cast_precision_loss)]
                let overlap = overlap as f32;
                overlap / denom
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_ranks_more_overlap_higher() {
        let reranker = LexicalOverlapReranker::new();
        let scores = reranker
            .score("rust error handling", &["rust error handling code", "unrelated text"])
            .unwrap();
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn test_score_empty_query_returns_zeros() {
        let reranker = LexicalOverlapReranker::new();
        let scores = reranker.score("", &["anything"]).unwrap();
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn test_score_empty_passages_returns_empty() {
        let reranker = LexicalOverlapReranker::new();
        let scores = reranker.score("query", &[]).unwrap();
        assert!(scores.is_empty());
    }
}
