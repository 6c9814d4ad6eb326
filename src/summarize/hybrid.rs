//! Hybrid summarization: extractive condensation followed by an
//! abstractive pass over the result.

use super::{AbstractiveSummarizer, ExtractiveSummarizer, Summarizer};
use crate::Result;

/// `abstractive(extractive(text))`.
pub struct HybridSummarizer {
    extractive: ExtractiveSummarizer,
    abstractive: AbstractiveSummarizer,
}

impl HybridSummarizer {
    /// Builds a hybrid summarizer from its two stages.
    #[must_use]
    pub const fn new(extractive: ExtractiveSummarizer, abstractive: AbstractiveSummarizer) -> Self {
        Self {
            extractive,
            abstractive,
        }
    }
}

impl Summarizer for HybridSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let extracted = self.extractive.summarize(text)?;
        self.abstractive.summarize(&extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::FallbackEmbedder;
    use std::sync::Arc;

    fn summarizer() -> HybridSummarizer {
        HybridSummarizer::new(
            ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 2),
            AbstractiveSummarizer::with_truncating_fallback(),
        )
    }

    #[test]
    fn test_empty_input_returns_empty() {
        assert_eq!(summarizer().summarize("").unwrap(), "");
    }

    #[test]
    fn test_runs_extractive_then_abstractive() {
        let text = "One sentence. Two sentence. Three sentence. Four sentence. Five sentence.";
        let result = summarizer().summarize(text).unwrap();
        assert!(!result.is_empty());
        // Extractive narrows to 2 sentences before the abstractive (here,
        // truncating) pass runs, so the result is far shorter than input.
        assert!(result.len() <= text.len());
    }
}
