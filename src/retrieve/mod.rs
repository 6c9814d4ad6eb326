//! Multi-Stage Retriever (spec.md §4.7).
//!
//! Shared across both artifact classes: embed -> overview/chunk search ->
//! (chunk path only) dedup -> cross-rerank -> hybrid summarize.
//! Parameterized by artifact class so one implementation serves
//! `DocumentService` and `RepositoryService` alike — the class supplies
//! both the pair of collections to search and the `artifactIdField` name
//! the filter tree scopes by.

use crate::core::{ArtifactClass, ChunkQueryResponse, FilterNode, Hit, OverviewQueryResponse, QueryRequest};
use crate::error::RetrievalError;
use crate::rerank::CrossEncoder;
use crate::store::{CollectionName, VectorStore};
use crate::summarize::{HybridSummarizer, Summarizer};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Number of leading characters of a hit's content offered to the
/// cross-encoder per pair (spec.md §4.7 step 4).
pub const CROSS_ENCODER_PASSAGE_CHARS: usize = 512;

/// Character length the final summary falls back to when the hybrid
/// summarizer itself fails (spec.md §4.7 step 5).
pub const FINAL_SUMMARY_FALLBACK_CHARS: usize = 4_000;

/// Retriever-tunable settings.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Maximum number of hits kept after cross-rerank.
    pub rerank_top_k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self { rerank_top_k: 10 }
    }
}

/// Multi-stage retriever over one artifact class's overview/chunk
/// collection pair.
pub struct MultiStageRetriever {
    class: ArtifactClass,
    store: Arc<VectorStore>,
    cross_encoder: Arc<dyn CrossEncoder>,
    summarizer: HybridSummarizer,
    config: RetrieverConfig,
}

impl MultiStageRetriever {
    /// Builds a retriever for `class` over `store`.
    #[must_use]
    pub fn new(
        class: ArtifactClass,
        store: Arc<VectorStore>,
        cross_encoder: Arc<dyn CrossEncoder>,
        summarizer: HybridSummarizer,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            class,
            store,
            cross_encoder,
            summarizer,
            config,
        }
    }

    /// Runs an overview-level query (spec.md §4.7 `overviewQuery`).
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::EmptyQuery`] if `req.query` is blank.
    pub fn overview_query(&self, req: &QueryRequest) -> Result<OverviewQueryResponse> {
        if !req.is_valid() {
            return Err(RetrievalError::EmptyQuery.into());
        }
        tracing::info!(class = %self.class, query = %req.query, "overview query");

        let filter = self.build_filter("overview", req.artifact_ids.as_ref());
        let hits = self.store.retrieve(
            CollectionName::overview_for(self.class),
            &req.query,
            Some(&filter),
            req.top_k,
        )?;

        Ok(OverviewQueryResponse {
            query: req.query.clone(),
            top_k: req.top_k,
            artifact_ids: req.artifact_ids.clone(),
            hits,
        })
    }

    /// Runs a chunk-level query (spec.md §4.7 `chunkQuery`): retrieve,
    /// dedup, cross-rerank, then synthesize a final summary.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::EmptyQuery`] if `req.query` is blank.
    /// Never raises on an empty result set; returns a well-formed empty
    /// response instead.
    pub fn chunk_query(&self, req: &QueryRequest) -> Result<ChunkQueryResponse> {
        if !req.is_valid() {
            return Err(RetrievalError::EmptyQuery.into());
        }
        tracing::info!(class = %self.class, query = %req.query, "chunk query");

        let filter = self.build_filter("chunk", req.artifact_ids.as_ref());
        let hits = self.store.retrieve(
            CollectionName::chunk_for(self.class),
            &req.query,
            Some(&filter),
            req.top_k,
        )?;
        if hits.is_empty() {
            return Ok(ChunkQueryResponse::empty(req));
        }

        let deduped = dedup_keep_last(hits);
        let reranked = self.cross_rerank(&req.query, deduped);
        let final_summary = self.summarize_hits(&reranked);

        Ok(ChunkQueryResponse {
            query: req.query.clone(),
            top_k: req.top_k,
            artifact_ids: req.artifact_ids.clone(),
            hits: reranked,
            final_summary,
        })
    }

    fn build_filter(&self, record_type: &str, artifact_ids: Option<&HashSet<String>>) -> FilterNode {
        let type_filter = FilterNode::in_values("type", vec![record_type.to_string()]);
        match artifact_ids {
            Some(ids) if !ids.is_empty() => {
                let id_filter =
                    FilterNode::in_values(self.class.artifact_id_field(), ids.iter().cloned().collect());
                type_filter.and(id_filter)
            }
            _ => type_filter,
        }
    }

    fn cross_rerank(&self, query: &str, hits: Vec<Hit>) -> Vec<Hit> {
        let candidates: Vec<Hit> = hits.into_iter().filter(|h| !h.content.is_empty()).collect();
        if candidates.is_empty() {
            return candidates;
        }

        let passages: Vec<&str> = candidates
            .iter()
            .map(|h| truncate_str(&h.content, CROSS_ENCODER_PASSAGE_CHARS))
            .collect();
        let score_result = self.cross_encoder.score(query, &passages);
        drop(passages);

        let top_k = self.config.rerank_top_k.min(candidates.len());
        match score_result {
            Ok(scores) => {
                let mut scored: Vec<(Hit, f32)> = candidates.into_iter().zip(scores).collect();
                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                scored
                    .into_iter()
                    .take(top_k)
                    .map(|(mut h, score)| {
                        h.score = Some(score);
                        h
                    })
                    .collect()
            }
            Err(err) => {
                tracing::warn!(error = %err, "cross-encoder failed, falling back to retrieval order");
                candidates.into_iter().take(top_k).collect()
            }
        }
    }

    fn summarize_hits(&self, hits: &[Hit]) -> String {
        let concatenated = hits
            .iter()
            .map(|h| h.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        if concatenated.trim().is_empty() {
            return String::new();
        }
        match self.summarizer.summarize(&concatenated) {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(error = %err, "final summary failed, falling back to truncation");
                concatenated.chars().take(FINAL_SUMMARY_FALLBACK_CHARS).collect()
            }
        }
    }
}

fn dedup_keep_last(hits: Vec<Hit>) -> Vec<Hit> {
    let mut last_index = std::collections::HashMap::new();
    for (i, hit) in hits.iter().enumerate() {
        last_index.insert(hit.id.clone(), i);
    }
    hits.into_iter()
        .enumerate()
        .filter(|(i, hit)| last_index.get(&hit.id) == Some(i))
        .map(|(_, hit)| hit)
        .collect()
}

fn truncate_str(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::FallbackEmbedder;
    use crate::error::ModelError;
    use crate::rerank::LexicalOverlapReranker;
    use crate::store::WriteRecord;
    use crate::summarize::{AbstractiveSummarizer, ExtractiveSummarizer};

    fn summarizer() -> HybridSummarizer {
        HybridSummarizer::new(
            ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 3),
            AbstractiveSummarizer::with_truncating_fallback(),
        )
    }

    fn seeded_store() -> Arc<VectorStore> {
        let store = VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap();
        store
            .write(
                CollectionName::DocumentChunk,
                &[
                    WriteRecord::new(
                        "doc-1_0".to_string(),
                        "rust error handling patterns".to_string(),
                        serde_json::json!({"type": "chunk", "artifactId": "doc-1", "doc_id": "doc-1"}),
                    ),
                    WriteRecord::new(
                        "doc-2_0".to_string(),
                        "rust error handling patterns again".to_string(),
                        serde_json::json!({"type": "chunk", "artifactId": "doc-2", "doc_id": "doc-2"}),
                    ),
                ],
            )
            .unwrap();
        store
            .write(
                CollectionName::DocumentOverview,
                &[
                    WriteRecord::new(
                        "doc-1_overview".to_string(),
                        "overview of doc one".to_string(),
                        serde_json::json!({"type": "overview", "artifactId": "doc-1", "doc_id": "doc-1"}),
                    ),
                    WriteRecord::new(
                        "doc-2_overview".to_string(),
                        "overview of doc two".to_string(),
                        serde_json::json!({"type": "overview", "artifactId": "doc-2", "doc_id": "doc-2"}),
                    ),
                ],
            )
            .unwrap();
        Arc::new(store)
    }

    fn retriever(store: Arc<VectorStore>) -> MultiStageRetriever {
        MultiStageRetriever::new(
            ArtifactClass::Document,
            store,
            Arc::new(LexicalOverlapReranker::new()),
            summarizer(),
            RetrieverConfig::default(),
        )
    }

    #[test]
    fn test_overview_query_scopes_by_artifact_ids() {
        let retriever = retriever(seeded_store());
        let req = QueryRequest::new("overview").with_artifact_ids(["doc-1".to_string()]);
        let resp = retriever.overview_query(&req).unwrap();
        assert!(resp.hits.iter().all(|h| h.artifact_id() == Some("doc-1")));
        assert_eq!(resp.hits.len(), 1);
    }

    #[test]
    fn test_chunk_query_empty_query_errors() {
        let retriever = retriever(seeded_store());
        let req = QueryRequest::new("   ");
        let err = retriever.chunk_query(&req).unwrap_err();
        assert!(matches!(err, crate::Error::Retrieval(RetrievalError::EmptyQuery)));
    }

    #[test]
    fn test_chunk_query_produces_final_summary_and_no_duplicate_ids() {
        let retriever = retriever(seeded_store());
        let req = QueryRequest::new("rust error handling");
        let resp = retriever.chunk_query(&req).unwrap();
        assert!(!resp.hits.is_empty());
        assert!(!resp.final_summary.is_empty());
        let mut ids: Vec<&str> = resp.hits.iter().map(|h| h.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), resp.hits.len());
    }

    #[test]
    fn test_chunk_query_no_hits_returns_well_formed_empty_response() {
        let store = Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap());
        let retriever = retriever(store);
        let req = QueryRequest::new("anything at all");
        let resp = retriever.chunk_query(&req).unwrap();
        assert!(resp.hits.is_empty());
        assert_eq!(resp.final_summary, "");
    }

    struct FailingCrossEncoder;
    impl CrossEncoder for FailingCrossEncoder {
        fn score(&self, _query: &str, _passages: &[&str]) -> Result<Vec<f32>> {
            Err(ModelError::CrossEncoder("boom".to_string()).into())
        }
    }

    #[test]
    fn test_cross_encoder_failure_falls_back_to_retrieval_order() {
        let retriever = MultiStageRetriever::new(
            ArtifactClass::Document,
            seeded_store(),
            Arc::new(FailingCrossEncoder),
            summarizer(),
            RetrieverConfig::default(),
        );
        let req = QueryRequest::new("rust error handling");
        let resp = retriever.chunk_query(&req).unwrap();
        assert!(!resp.hits.is_empty());
        assert!(resp.hits.len() <= RetrieverConfig::default().rerank_top_k);
    }

    #[test]
    fn test_dedup_keep_last_removes_duplicate_ids() {
        let hits = vec![
            Hit {
                id: "a".to_string(),
                content: "first".to_string(),
                meta: serde_json::Value::Null,
                score: None,
            },
            Hit {
                id: "b".to_string(),
                content: "b text".to_string(),
                meta: serde_json::Value::Null,
                score: None,
            },
            Hit {
                id: "a".to_string(),
                content: "second".to_string(),
                meta: serde_json::Value::Null,
                score: None,
            },
        ];
        let result = dedup_keep_last(hits);
        assert_eq!(result.len(), 2);
        let a = result.iter().find(|h| h.id == "a").unwrap();
        assert_eq!(a.content, "second");
    }

    #[test]
    fn test_truncate_str_respects_char_boundary() {
        let text = "hello world";
        assert_eq!(truncate_str(text, 5), "hello");
        assert_eq!(truncate_str(text, 100), text);
    }
}
