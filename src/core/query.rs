//! Query request/response types and the filter-tree combinator language.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A comparison operator usable at a filter leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Field value must be contained in the leaf's value list.
    In,
    /// All child conditions must hold (only meaningful on composite nodes).
    And,
}

/// A node in the filter-tree combinator language used to scope a vector
/// search. Leaves compare a metadata field against a set of allowed
/// values; composites combine child nodes with AND.
///
/// A retriever resolves a fresh [`FilterNode`] tree per call rather than
/// mutating any shared state, so concurrent queries with different
/// filters cannot interfere with each other (see `store` module docs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum FilterNode {
    /// A leaf predicate: `field IN (values)`.
    Leaf {
        /// Metadata field name to compare.
        field: String,
        /// Operator applied (currently only [`FilterOperator::In`] is valid
        /// on a leaf).
        operator: FilterOperator,
        /// Allowed values for the field.
        value: Vec<String>,
    },
    /// A composite predicate combining children with an operator (currently
    /// only [`FilterOperator::And`] is valid on a composite).
    Composite {
        /// Operator combining the child conditions.
        operator: FilterOperator,
        /// Child filter nodes.
        conditions: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Builds a leaf `field IN (values)` filter.
    #[must_use]
    pub fn in_values(field: impl Into<String>, value: Vec<String>) -> Self {
        Self::Leaf {
            field: field.into(),
            operator: FilterOperator::In,
            value,
        }
    }

    /// Combines this filter with another under an AND composite.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Composite {
                operator: FilterOperator::And,
                mut conditions,
            } => {
                conditions.push(other);
                Self::Composite {
                    operator: FilterOperator::And,
                    conditions,
                }
            }
            leaf => Self::Composite {
                operator: FilterOperator::And,
                conditions: vec![leaf, other],
            },
        }
    }

    /// Returns `true` if every leaf's `field` is a plain identifier
    /// (ASCII alphanumeric, `_`), rejecting field names that could be used
    /// to smuggle SQL fragments into a hand-built `WHERE` clause.
    #[must_use]
    pub fn has_safe_field_names(&self) -> bool {
        match self {
            Self::Leaf { field, .. } => {
                !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            Self::Composite { conditions, .. } => {
                conditions.iter().all(Self::has_safe_field_names)
            }
        }
    }
}

/// The default number of hits returned when a [`QueryRequest`] omits
/// `topK`.
pub const DEFAULT_TOP_K: usize = 5;

/// A retrieval request against one artifact class's overview or chunk
/// collection, per spec.md §3 `QueryRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Natural-language query text. Must be non-empty.
    pub query: String,
    /// Maximum number of hits to return. Defaults to [`DEFAULT_TOP_K`].
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Restrict the search to these artifact ids, or search every indexed
    /// artifact of the collection's class when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_ids: Option<HashSet<String>>,
}

const fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl QueryRequest {
    /// Builds a query request with the default `topK` and no artifact
    /// scoping.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            artifact_ids: None,
        }
    }

    /// Sets `topK`.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Scopes this request to the given artifact ids.
    #[must_use]
    pub fn with_artifact_ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.artifact_ids = Some(ids.into_iter().collect());
        self
    }

    /// Returns `true` if the query text is non-empty after trimming.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// One scored result returned by a collection retriever: the stored
/// record (`id`, `content`, `meta`) plus its similarity or rerank score.
///
/// `meta` is kept as an untyped JSON value here because the store
/// coordinator persists records generically; callers that need a
/// structured view (`ChunkMeta`/`OverviewMeta`) deserialize it themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    /// Stable id of the matched record (chunk id or overview id).
    pub id: String,
    /// Stored content.
    pub content: String,
    /// Stored metadata.
    pub meta: serde_json::Value,
    /// Similarity or rerank score; higher is better. `None` before any
    /// scoring stage has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Hit {
    /// Reads `meta.artifactId` as a string, if present.
    #[must_use]
    pub fn artifact_id(&self) -> Option<&str> {
        self.meta.get("artifactId").and_then(serde_json::Value::as_str)
    }
}

/// Response shape for an overview-level query: echoes the request plus
/// the ranked overview hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQueryResponse {
    /// Echoed query text.
    pub query: String,
    /// Echoed `topK`.
    pub top_k: usize,
    /// Echoed artifact scoping, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_ids: Option<HashSet<String>>,
    /// Ranked overview hits.
    pub hits: Vec<Hit>,
}

impl OverviewQueryResponse {
    /// Builds the canonical well-formed empty response for a request that
    /// matched nothing.
    #[must_use]
    pub fn empty(req: &QueryRequest) -> Self {
        Self {
            query: req.query.clone(),
            top_k: req.top_k,
            artifact_ids: req.artifact_ids.clone(),
            hits: Vec::new(),
        }
    }
}

/// Response shape for a chunk-level query: echoes the request, the
/// reranked chunk hits, and the synthesized final summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkQueryResponse {
    /// Echoed query text.
    pub query: String,
    /// Echoed `topK`.
    pub top_k: usize,
    /// Echoed artifact scoping, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_ids: Option<HashSet<String>>,
    /// Reranked chunk hits (deduplicated by id).
    pub hits: Vec<Hit>,
    /// Hybrid summary synthesized from `hits`, or empty if there were none.
    pub final_summary: String,
}

impl ChunkQueryResponse {
    /// Builds the canonical well-formed empty response for a request that
    /// matched nothing.
    #[must_use]
    pub fn empty(req: &QueryRequest) -> Self {
        Self {
            query: req.query.clone(),
            top_k: req.top_k,
            artifact_ids: req.artifact_ids.clone(),
            hits: Vec::new(),
            final_summary: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_in_values() {
        let filter = FilterNode::in_values("filePath", vec!["a.rs".to_string()]);
        assert!(matches!(filter, FilterNode::Leaf { .. }));
    }

    #[test]
    fn test_filter_and_composes() {
        let a = FilterNode::in_values("artifactId", vec!["repo-1".to_string()]);
        let b = FilterNode::in_values("filePath", vec!["a.rs".to_string()]);
        let composed = a.and(b);
        match composed {
            FilterNode::Composite { conditions, .. } => assert_eq!(conditions.len(), 2),
            FilterNode::Leaf { .. } => panic!("expected composite"),
        }
    }

    #[test]
    fn test_filter_rejects_unsafe_field_name() {
        let filter = FilterNode::in_values("artifactId; DROP TABLE x", vec!["1".to_string()]);
        assert!(!filter.has_safe_field_names());
    }

    #[test]
    fn test_query_request_defaults() {
        let req = QueryRequest::new("find auth code");
        assert_eq!(req.top_k, DEFAULT_TOP_K);
        assert!(req.artifact_ids.is_none());
        assert!(req.is_valid());
    }

    #[test]
    fn test_query_request_empty_is_invalid() {
        let req = QueryRequest::new("   ");
        assert!(!req.is_valid());
    }

    #[test]
    fn test_query_request_with_artifact_ids() {
        let req = QueryRequest::new("find auth code").with_artifact_ids(["repo-1".to_string()]);
        assert!(req.artifact_ids.unwrap().contains("repo-1"));
    }

    #[test]
    fn test_overview_response_empty() {
        let req = QueryRequest::new("q");
        let resp = OverviewQueryResponse::empty(&req);
        assert!(resp.hits.is_empty());
        assert_eq!(resp.query, "q");
    }

    #[test]
    fn test_chunk_response_empty() {
        let req = QueryRequest::new("q");
        let resp = ChunkQueryResponse::empty(&req);
        assert!(resp.hits.is_empty());
        assert!(resp.final_summary.is_empty());
    }

    #[test]
    fn test_hit_artifact_id_reads_meta() {
        let hit = Hit {
            id: "a_overview".to_string(),
            content: "text".to_string(),
            meta: serde_json::json!({"artifactId": "a1"}),
            score: Some(0.9),
        };
        assert_eq!(hit.artifact_id(), Some("a1"));
    }
}
