//! `rust-bert` seq2seq summarization backend.
//!
//! Real abstractive summarization via `rust-bert`'s `SummarizationModel`
//! pipeline (BART by default). Gated behind `abstractive-bert` since the
//! model weights are multi-gigabyte and not something a default build or
//! CI should download.

use super::AbstractiveModel;
use crate::Result;
use crate::error::ModelError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::OnceLock;

static SUMMARIZATION_MODEL: OnceLock<std::sync::Mutex<rust_bert::pipelines::summarization::SummarizationModel>> =
    OnceLock::new();

/// Abstractive backend using `rust-bert`'s summarization pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBertAbstractiveModel;

impl RustBertAbstractiveModel {
    /// Builds a new `rust-bert`-backed abstractive model. The underlying
    /// pipeline is lazily loaded on first [`AbstractiveModel::generate`]
    /// call.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn get_model()
    -> Result<&'static std::sync::Mutex<rust_bert::pipelines::summarization::SummarizationModel>> {
        if let Some(model) = SUMMARIZATION_MODEL.get() {
            return Ok(model);
        }

        let config = rust_bert::pipelines::summarization::SummarizationConfig::default();
        let model = rust_bert::pipelines::summarization::SummarizationModel::new(config)
            .map_err(|e| ModelError::Summarization(format!("failed to load summarization model: {e}")))?;

        let _ = SUMMARIZATION_MODEL.set(std::sync::Mutex::new(model));

        SUMMARIZATION_MODEL
            .get()
            .ok_or_else(|| ModelError::Summarization("summarization model initialization race".to_string()).into())
    }
}

impl AbstractiveModel for RustBertAbstractiveModel {
    fn generate(&self, text: &str, _max_len: usize, _min_len: usize) -> Result<String> {
        let model = Self::get_model()?;
        let mut model = model
            .lock()
            .map_err(|e| ModelError::Summarization(format!("failed to lock summarization model: {e}")))?;

        let input = [text];
        let result = catch_unwind(AssertUnwindSafe(|| model.summarize(&input)));

        let summaries = result
            .map_err(|panic_info| {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                ModelError::Summarization(format!("summarization runtime panic: {msg}"))
            })?
            .map_err(|e| ModelError::Summarization(format!("summarization failed: {e}")))?;

        summaries
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Summarization("no summary returned from model".to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_constructible() {
        let _model = RustBertAbstractiveModel::new();
    }

    #[test]
    #[ignore = "requires rust-bert summarization model download"]
    fn test_generate_success() {
        let model = RustBertAbstractiveModel::new();
        let result = model.generate("Some long text to summarize.", 150, 30);
        assert!(result.is_ok());
    }
}
