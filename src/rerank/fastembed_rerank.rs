//! `FastEmbed`-based cross-encoder reranker.
//!
//! Uses fastembed-rs's ONNX reranking pipeline, gated behind the same
//! `fastembed-embeddings` feature as [`crate::embedding::FastEmbedEmbedder`]
//! since both are ONNX-model-backed and share the download/runtime
//! dependency.

use crate::Result;
use crate::error::ModelError;
use crate::rerank::CrossEncoder;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::OnceLock;

static RERANK_MODEL: OnceLock<std::sync::Mutex<fastembed::TextRerank>> = OnceLock::new();

/// Cross-encoder backed by fastembed's ONNX reranking model.
pub struct FastEmbedReranker {
    model_name: &'static str,
}

impl Default for FastEmbedReranker {
    fn default() -> Self {
        Self::new()
    }
}

impl FastEmbedReranker {
    /// Creates a new fastembed-backed reranker. The model is lazily
    /// loaded on first [`CrossEncoder::score`] call.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            model_name: "jina-reranker-v1-turbo-en",
        }
    }

    /// Returns the model name.
    #[must_use]
    pub const fn model_name(&self) -> &'static str {
        self.model_name
    }

    fn get_model() -> Result<&'static std::sync::Mutex<fastembed::TextRerank>> {
        if let Some(model) = RERANK_MODEL.get() {
            return Ok(model);
        }

        let options = fastembed::RerankInitOptions::new(fastembed::RerankerModel::JINARerankerV1TurboEn)
            .with_show_download_progress(false);

        let model = fastembed::TextRerank::try_new(options)
            .map_err(|e| ModelError::CrossEncoder(format!("failed to load reranker model: {e}")))?;

        let _ = RERANK_MODEL.set(std::sync::Mutex::new(model));

        RERANK_MODEL
            .get()
            .ok_or_else(|| ModelError::CrossEncoder("reranker model initialization race".to_string()).into())
    }
}

impl CrossEncoder for FastEmbedReranker {
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let model = Self::get_model()?;
        let mut model = model
            .lock()
            .map_err(|e| ModelError::CrossEncoder(format!("failed to lock reranker model: {e}")))?;

        let documents: Vec<&str> = passages.to_vec();
        let result = catch_unwind(AssertUnwindSafe(|| {
            model.rerank(query, documents, false, None)
        }));

        let results = result
            .map_err(|panic_info| {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                ModelError::CrossEncoder(format!("reranker runtime panic: {msg}"))
            })?
            .map_err(|e| ModelError::CrossEncoder(format!("reranking failed: {e}")))?;

        let mut scores = vec![0.0_f32; passages.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score;
            }
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name() {
        let reranker = FastEmbedReranker::new();
        assert_eq!(reranker.model_name(), "jina-reranker-v1-turbo-en");
    }

    #[test]
    fn test_score_empty_passages_returns_empty() {
        let reranker = FastEmbedReranker::new();
        assert!(reranker.score("q", &[]).unwrap().is_empty());
    }

    #[test]
    #[ignore = "requires fastembed reranker model download"]
    fn test_score_success() {
        let reranker = FastEmbedReranker::new();
        let scores = reranker.score("rust error handling", &["a", "b"]).unwrap();
        assert_eq!(scores.len(), 2);
    }
}
