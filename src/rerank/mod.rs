//! Cross-encoder reranking.
//!
//! Mirrors the `embedding` module's trait-plus-singleton shape (spec.md
//! §4.10/C7 step 4): a single process-wide [`CrossEncoder`] instance,
//! read-only after warm-up, used by the multi-stage retriever to reorder
//! chunk-query candidates by a pairwise `(query, passage)` relevance
//! score. Cross-encoder failure is a [`crate::error::ModelError`] the
//! retriever catches and falls back from — it is never propagated to a
//! query caller.

mod lexical;

#[cfg(feature = "fastembed-embeddings")]
mod fastembed_rerank;

pub use lexical::LexicalOverlapReranker;

#[cfg(feature = "fastembed-embeddings")]
pub use fastembed_rerank::FastEmbedReranker;

use crate::Result;

/// Trait for pairwise query/passage relevance scoring.
///
/// Implementations must be `Send + Sync`: the retriever may call `score`
/// from any worker-pool thread.
pub trait CrossEncoder: Send + Sync {
    /// Scores every passage against `query`. Returns one score per
    /// passage, in the same order, higher meaning more relevant.
    ///
    /// # Errors
    ///
    /// Returns an error if scoring fails; callers fall back to retrieval
    /// order per spec.md §4.7 step 4.
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>>;
}

/// Creates the default cross-encoder based on available features.
///
/// - With `fastembed-embeddings`: returns [`FastEmbedReranker`].
/// - Without: returns [`LexicalOverlapReranker`], a deterministic
///   word-overlap scorer used by default builds and the test suite.
#[cfg(feature = "fastembed-embeddings")]
#[must_use]
pub fn create_cross_encoder() -> Box<dyn CrossEncoder> {
    Box::new(FastEmbedReranker::new())
}

/// Creates the default cross-encoder based on available features.
#[cfg(not(feature = "fastembed-embeddings"))]
#[must_use]
pub fn create_cross_encoder() -> Box<dyn CrossEncoder> {
    Box::new(LexicalOverlapReranker::new())
}
