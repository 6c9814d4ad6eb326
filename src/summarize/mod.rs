//! Summarization strategies.
//!
//! One trait, four structs, no inheritance (Design Note §9): `Extractive`
//! (centroid-based sentence selection), `Abstractive` (seq2seq model with a
//! truncation fallback), `Hybrid` (`abstractive(extractive(text))`), and
//! `Hierarchical` (per-chunk extractive, joined, then `Hybrid`) — used by
//! the Overview Builder and the chunk-query final-summary step.

mod abstractive;
mod extractive;
mod hierarchical;
mod hybrid;

pub use abstractive::{AbstractiveModel, AbstractiveSummarizer, TruncatingAbstractiveModel};
pub use extractive::ExtractiveSummarizer;
pub use hierarchical::HierarchicalSummarizer;
pub use hybrid::HybridSummarizer;

#[cfg(feature = "abstractive-bert")]
mod rust_bert_impl;
#[cfg(feature = "abstractive-bert")]
pub use rust_bert_impl::RustBertAbstractiveModel;

use crate::Result;

/// Common contract for every summarization strategy.
///
/// Implementations must be `Send + Sync`: the retriever and overview
/// builder may invoke a summarizer from a blocking worker-pool thread.
pub trait Summarizer: Send + Sync {
    /// Summarizes `text`. Empty input always produces empty output.
    ///
    /// # Errors
    ///
    /// Summarizers are designed never to raise in practice (model failure
    /// falls back to truncation), but the signature returns `Result` so a
    /// caller-supplied backend may still surface a hard configuration
    /// error.
    fn summarize(&self, text: &str) -> Result<String>;
}

/// Splits `text` into sentences on `.`/`!`/`?` followed by whitespace (or
/// end of string), trimming each sentence and dropping empties.
///
/// This is a deliberately simple heuristic splitter — good enough for the
/// centroid-based extractive scorer, which only needs stable, reproducible
/// sentence boundaries, not linguistic precision.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(byte_idx, ch)) in chars.iter().enumerate() {
        if ch == '.' || ch == '!' || ch == '?' {
            let boundary = chars.get(i + 1).is_none_or(|&(_, next)| next.is_whitespace());
            if boundary {
                let end = byte_idx + ch.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = end;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_basic() {
        let sentences = split_sentences("One. Two! Three?");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?"]);
    }

    #[test]
    fn test_split_sentences_no_terminal_punctuation() {
        let sentences = split_sentences("just one fragment");
        assert_eq!(sentences, vec!["just one fragment"]);
    }

    #[test]
    fn test_split_sentences_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_split_sentences_decimal_not_split() {
        // A period not followed by whitespace is not a sentence boundary.
        let sentences = split_sentences("Value is 3.14 exactly.");
        assert_eq!(sentences, vec!["Value is 3.14 exactly."]);
    }
}
