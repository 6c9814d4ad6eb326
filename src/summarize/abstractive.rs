//! Abstractive (seq2seq) summarization with a deterministic fallback.

use super::Summarizer;
use crate::Result;
use std::sync::Arc;

/// Length, in characters, kept by the truncation fallback when the
/// abstractive backend fails or is not compiled in.
pub const FALLBACK_TRUNCATE_CHARS: usize = 500;

/// Backend contract for a sequence-to-sequence summarization model.
///
/// Swappable so the default build can ship a deterministic stub while
/// `abstractive-bert` plugs in a real seq2seq pipeline.
pub trait AbstractiveModel: Send + Sync {
    /// Generates an abstractive summary of `text`, targeting a summary
    /// between `min_len` and `max_len` (model-defined unit, typically
    /// tokens).
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails to produce output; callers fall
    /// back to truncation and must never propagate this error to a query
    /// caller (spec.md §4.1).
    fn generate(&self, text: &str, max_len: usize, min_len: usize) -> Result<String>;
}

/// Deterministic fallback backend: truncates to
/// [`FALLBACK_TRUNCATE_CHARS`] characters and never fails. Used by default
/// builds and the test suite so summarization stays assertable without a
/// model download.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruncatingAbstractiveModel;

impl TruncatingAbstractiveModel {
    /// Builds a new truncating stub backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AbstractiveModel for TruncatingAbstractiveModel {
    fn generate(&self, text: &str, _max_len: usize, _min_len: usize) -> Result<String> {
        Ok(truncate_chars(text, FALLBACK_TRUNCATE_CHARS))
    }
}

/// Truncates `text` to at most `max_chars` Unicode scalar values, without
/// splitting a multi-byte character.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Abstractive summarizer: invokes an [`AbstractiveModel`], falling back to
/// a 500-character truncation of the input on model failure. Never raises.
pub struct AbstractiveSummarizer {
    model: Arc<dyn AbstractiveModel>,
    max_len: usize,
    min_len: usize,
}

impl AbstractiveSummarizer {
    /// Builds an abstractive summarizer backed by `model`, requesting
    /// summaries between `min_len` and `max_len`.
    #[must_use]
    pub const fn new(model: Arc<dyn AbstractiveModel>, max_len: usize, min_len: usize) -> Self {
        Self {
            model,
            max_len,
            min_len,
        }
    }

    /// Builds an abstractive summarizer using the deterministic truncation
    /// backend (no model download required).
    #[must_use]
    pub fn with_truncating_fallback() -> Self {
        Self::new(Arc::new(TruncatingAbstractiveModel::new()), 150, 30)
    }
}

impl Summarizer for AbstractiveSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        match self.model.generate(text, self.max_len, self.min_len) {
            Ok(summary) => Ok(summary),
            Err(err) => {
                tracing::warn!(error = %err, "abstractive model failed, falling back to truncation");
                Ok(truncate_chars(text, FALLBACK_TRUNCATE_CHARS))
            }
        }
    }
}
