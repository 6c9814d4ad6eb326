//! Tool Dispatcher (spec.md §4.9).
//!
//! A tool is a named callable `(service bundle, params) -> response`. The
//! dispatcher never raises to its caller: `invoke` always returns an
//! [`InvokeResponse`], wrapping either a successful result or an error
//! message under the same `toolId`.

use crate::core::QueryRequest;
use crate::error::ToolError;
use crate::service::{DocumentService, RepositoryService};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tool id for `DocumentService::overview_query`.
pub const DOCUMENT_OVERVIEW_QUERY: &str = "documentOverviewQuery";
/// Tool id for `DocumentService::chunk_query`.
pub const DOCUMENT_CHUNK_QUERY: &str = "documentChunkQuery";
/// Tool id for `RepositoryService::overview_query`.
pub const REPOSITORY_OVERVIEW_QUERY: &str = "repositoryOverviewQuery";
/// Tool id for `RepositoryService::chunk_query`.
pub const REPOSITORY_CHUNK_QUERY: &str = "repositoryChunkQuery";

/// Describes one tool a [`ToolRegistry`] exposes, as published to an
/// external event bus via [`crate::clients::ToolDescriptorPublisher`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool id, dispatched on by [`ToolRegistry::invoke`].
    pub tool_id: String,
    /// Human-readable description of what the tool does.
    pub description: String,
}

impl ToolDescriptor {
    /// Builds a tool descriptor.
    #[must_use]
    pub fn new(tool_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            description: description.into(),
        }
    }
}

/// A tool invocation request: a tool id plus a loosely-typed params bag.
/// The expected request payload for every built-in tool is a
/// [`QueryRequest`] nested under the `queryRequest` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    /// Id of the tool to invoke.
    pub tool_id: String,
    /// Arbitrary params; built-in tools read `params.queryRequest`.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl InvokeRequest {
    /// Builds an invoke request for `tool_id` with `query` as its
    /// `queryRequest` param.
    #[must_use]
    pub fn new(tool_id: impl Into<String>, query: QueryRequest) -> Self {
        Self {
            tool_id: tool_id.into(),
            params: serde_json::json!({ "queryRequest": query }),
        }
    }
}

/// Result of a tool invocation: always echoes `toolId`, plus exactly one
/// of `result`/`error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    /// Echoed tool id.
    pub tool_id: String,
    /// Successful result payload, if the call succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error message, if the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvokeResponse {
    fn success(tool_id: String, result: serde_json::Value) -> Self {
        Self {
            tool_id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(tool_id: String, message: String) -> Self {
        Self {
            tool_id,
            result: None,
            error: Some(message),
        }
    }
}

/// Dispatches the four built-in query tools against a document and
/// repository service.
pub struct ToolRegistry {
    document_service: Arc<DocumentService>,
    repository_service: Arc<RepositoryService>,
}

impl ToolRegistry {
    /// Builds a registry over the given services.
    #[must_use]
    pub const fn new(document_service: Arc<DocumentService>, repository_service: Arc<RepositoryService>) -> Self {
        Self {
            document_service,
            repository_service,
        }
    }

    /// Returns the descriptors for every built-in tool.
    #[must_use]
    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(DOCUMENT_OVERVIEW_QUERY, "Overview-level semantic search over indexed documents"),
            ToolDescriptor::new(DOCUMENT_CHUNK_QUERY, "Chunk-level semantic search over indexed documents"),
            ToolDescriptor::new(
                REPOSITORY_OVERVIEW_QUERY,
                "Overview-level semantic search over indexed repositories",
            ),
            ToolDescriptor::new(
                REPOSITORY_CHUNK_QUERY,
                "Chunk-level semantic search over indexed repositories",
            ),
        ]
    }

    /// Invokes `req.tool_id` against its handler. Never raises: any failure
    /// (empty tool id, unknown tool id, malformed params, or a handler
    /// error) is reported as `InvokeResponse { error: Some(_), .. }`.
    #[must_use]
    pub fn invoke(&self, req: &InvokeRequest) -> InvokeResponse {
        if req.tool_id.trim().is_empty() {
            return InvokeResponse::failure(req.tool_id.clone(), ToolError::EmptyToolId.to_string());
        }
        match self.dispatch(req) {
            Ok(result) => InvokeResponse::success(req.tool_id.clone(), result),
            Err(err) => InvokeResponse::failure(req.tool_id.clone(), err.to_string()),
        }
    }

    fn dispatch(&self, req: &InvokeRequest) -> Result<serde_json::Value> {
        match req.tool_id.as_str() {
            DOCUMENT_OVERVIEW_QUERY => {
                let query = extract_query_request(&req.params)?;
                let response = self.document_service.overview_query(&query)?;
                Ok(serde_json::to_value(response).unwrap_or(serde_json::Value::Null))
            }
            DOCUMENT_CHUNK_QUERY => {
                let query = extract_query_request(&req.params)?;
                let response = self.document_service.chunk_query(&query)?;
                Ok(serde_json::to_value(response).unwrap_or(serde_json::Value::Null))
            }
            REPOSITORY_OVERVIEW_QUERY => {
                let query = extract_query_request(&req.params)?;
                let response = self.repository_service.overview_query(&query)?;
                Ok(serde_json::to_value(response).unwrap_or(serde_json::Value::Null))
            }
            REPOSITORY_CHUNK_QUERY => {
                let query = extract_query_request(&req.params)?;
                let response = self.repository_service.chunk_query(&query)?;
                Ok(serde_json::to_value(response).unwrap_or(serde_json::Value::Null))
            }
            other => Err(ToolError::UnknownTool {
                tool_id: other.to_string(),
            }
            .into()),
        }
    }
}

fn extract_query_request(params: &serde_json::Value) -> Result<QueryRequest> {
    let raw = params
        .get("queryRequest")
        .ok_or_else(|| ToolError::InvalidParams("missing \"queryRequest\" param".to_string()))?;
    serde_json::from_value(raw.clone()).map_err(|e| ToolError::InvalidParams(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::LocalArtifactSource;
    use crate::core::ArtifactClass;
    use crate::embedding::FallbackEmbedder;
    use crate::index::{DocumentIndexer, RepositoryIndexer};
    use crate::overview::OverviewBuilder;
    use crate::rerank::LexicalOverlapReranker;
    use crate::retrieve::{MultiStageRetriever, RetrieverConfig};
    use crate::store::VectorStore;
    use crate::summarize::{AbstractiveSummarizer, ExtractiveSummarizer, HierarchicalSummarizer, HybridSummarizer};

    fn overview_builder() -> OverviewBuilder {
        OverviewBuilder::new(HierarchicalSummarizer::new(
            ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 3),
            HybridSummarizer::new(
                ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 3),
                AbstractiveSummarizer::with_truncating_fallback(),
            ),
        ))
    }

    fn hybrid_summarizer() -> HybridSummarizer {
        HybridSummarizer::new(
            ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 3),
            AbstractiveSummarizer::with_truncating_fallback(),
        )
    }

    fn registry() -> ToolRegistry {
        let store = Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap());
        store
            .write(
                crate::store::CollectionName::DocumentChunk,
                &[crate::store::WriteRecord::new(
                    "doc-1_0".to_string(),
                    "rust retrieval engine chunking".to_string(),
                    serde_json::json!({"type": "chunk", "artifactId": "doc-1", "doc_id": "doc-1"}),
                )],
            )
            .unwrap();

        let document_service = Arc::new(DocumentService::new(
            Arc::new(LocalArtifactSource::new()),
            DocumentIndexer::new(overview_builder(), Arc::clone(&store)),
            MultiStageRetriever::new(
                ArtifactClass::Document,
                Arc::clone(&store),
                Arc::new(LexicalOverlapReranker::new()),
                hybrid_summarizer(),
                RetrieverConfig::default(),
            ),
        ));
        let repository_store = Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap());
        let repository_service = Arc::new(RepositoryService::new(
            Arc::new(LocalArtifactSource::new()),
            RepositoryIndexer::new(overview_builder(), Arc::clone(&repository_store)),
            MultiStageRetriever::new(
                ArtifactClass::Repository,
                repository_store,
                Arc::new(LexicalOverlapReranker::new()),
                hybrid_summarizer(),
                RetrieverConfig::default(),
            ),
        ));
        ToolRegistry::new(document_service, repository_service)
    }

    #[test]
    fn test_invoke_empty_tool_id_is_reported_as_error_not_panic() {
        let registry = registry();
        let req = InvokeRequest {
            tool_id: String::new(),
            params: serde_json::Value::Null,
        };
        let resp = registry.invoke(&req);
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }

    #[test]
    fn test_invoke_unknown_tool_id_is_reported_as_error() {
        let registry = registry();
        let req = InvokeRequest::new("frobnicate", QueryRequest::new("x"));
        let resp = registry.invoke(&req);
        assert_eq!(resp.tool_id, "frobnicate");
        assert!(resp.error.as_ref().unwrap().contains("frobnicate"));
    }

    #[test]
    fn test_invoke_missing_params_is_reported_as_error() {
        let registry = registry();
        let req = InvokeRequest {
            tool_id: DOCUMENT_CHUNK_QUERY.to_string(),
            params: serde_json::json!({}),
        };
        let resp = registry.invoke(&req);
        assert!(resp.error.is_some());
    }

    #[test]
    fn test_invoke_document_chunk_query_succeeds() {
        let registry = registry();
        let req = InvokeRequest::new(DOCUMENT_CHUNK_QUERY, QueryRequest::new("rust retrieval"));
        let resp = registry.invoke(&req);
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert!(result.get("hits").is_some());
    }

    #[test]
    fn test_descriptors_lists_all_four_built_ins() {
        let descriptors = ToolRegistry::descriptors();
        assert_eq!(descriptors.len(), 4);
        let ids: Vec<&str> = descriptors.iter().map(|d| d.tool_id.as_str()).collect();
        assert!(ids.contains(&DOCUMENT_OVERVIEW_QUERY));
        assert!(ids.contains(&REPOSITORY_CHUNK_QUERY));
    }
}
