//! Centroid-based extractive summarization.

use super::{Summarizer, split_sentences};
use crate::Result;
use crate::embedding::{Embedder, cosine_similarity};
use std::sync::Arc;

/// Extractive summarizer: sentence-tokenizes the input, embeds each
/// sentence, scores every sentence by cosine similarity to the centroid
/// (mean) of all sentence embeddings, and keeps the top `max_sentences` in
/// their original order.
pub struct ExtractiveSummarizer {
    embedder: Arc<dyn Embedder>,
    max_sentences: usize,
}

impl ExtractiveSummarizer {
    /// Builds an extractive summarizer backed by `embedder`, keeping at
    /// most `max_sentences` sentences.
    #[must_use]
    pub const fn new(embedder: Arc<dyn Embedder>, max_sentences: usize) -> Self {
        Self {
            embedder,
            max_sentences,
        }
    }
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let sentences = split_sentences(text);
        if sentences.len() <= self.max_sentences {
            return Ok(text.to_string());
        }

        let refs: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&refs)?;
        if embeddings.is_empty() {
            return Ok(text.to_string());
        }

        let dims = embeddings[0].len();
        let mut centroid = vec![0.0_f32; dims];
        for embedding in &embeddings {
            for (c, v) in centroid.iter_mut().zip(embedding.iter()) {
                *c += v;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let count = embeddings.len() as f32;
        for c in &mut centroid {
            *c /= count;
        }

        let mut scored: Vec<(usize, f32)> = embeddings
            .iter()
            .enumerate()
            .map(|(i, embedding)| (i, cosine_similarity(embedding, &centroid)))
            .collect();

        // Highest score first; ties broken by original index so selection
        // is deterministic regardless of sort stability guarantees.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let mut selected: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(i, _)| i)
            .collect();
        selected.sort_unstable();

        let summary = selected
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(summary)
    }
}
