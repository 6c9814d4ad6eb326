//! Service Facade (spec.md §4.8).
//!
//! `DocumentService` and `RepositoryService` each expose `add`,
//! `overview_query`, `chunk_query`. `add` is the only asynchronous
//! operation: it fetches metadata and content through an outbound client,
//! then dispatches the synchronous Indexer work to a worker pool via
//! `tokio::task::spawn_blocking` so the calling task is not blocked for the
//! duration of chunking/embedding/writing. `overview_query`/`chunk_query`
//! delegate directly to a `MultiStageRetriever`, which is itself
//! synchronous (no network I/O once the store is open).
//!
//! Each service is a process singleton, built once and shared behind
//! `Arc`/`OnceLock`, mirroring the warm-up-once shape the `embedding` and
//! `rerank` modules use for their model singletons.

use crate::clients::{DocumentServiceClient, RepositoryServiceClient};
use crate::core::{ChunkQueryResponse, OverviewQueryResponse, QueryRequest};
use crate::error::IndexError;
use crate::index::{DocumentIndexResult, DocumentIndexer, RepositoryIndexResult, RepositoryIndexer};
use crate::retrieve::MultiStageRetriever;
use crate::{Error, Result};
use std::sync::{Arc, OnceLock};

static DOCUMENT_SERVICE: OnceLock<Arc<DocumentService>> = OnceLock::new();
static REPOSITORY_SERVICE: OnceLock<Arc<RepositoryService>> = OnceLock::new();

/// Document-artifact service: ingestion plus overview/chunk queries.
pub struct DocumentService {
    client: Arc<dyn DocumentServiceClient>,
    indexer: Arc<DocumentIndexer>,
    retriever: MultiStageRetriever,
}

impl DocumentService {
    /// Builds a document service from its client and pipeline collaborators.
    #[must_use]
    pub fn new(
        client: Arc<dyn DocumentServiceClient>,
        indexer: DocumentIndexer,
        retriever: MultiStageRetriever,
    ) -> Self {
        Self {
            client,
            indexer: Arc::new(indexer),
            retriever,
        }
    }

    /// Returns the process-wide singleton, constructing it with `init` on
    /// first access. Subsequent calls ignore `init` and return the
    /// already-built instance.
    pub fn global(init: impl FnOnce() -> Self) -> Arc<Self> {
        Arc::clone(DOCUMENT_SERVICE.get_or_init(|| Arc::new(init())))
    }

    /// Fetches `document_id`'s metadata and latest attachment from the
    /// Document Service client, then indexes it on the worker pool.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::ClientError`] from the fetch step, or any
    /// error the synchronous [`DocumentIndexer::index`] raises (including a
    /// worker-pool panic, wrapped as [`IndexError::TaskPanicked`]).
    pub async fn add(&self, document_id: &str) -> Result<DocumentIndexResult> {
        tracing::info!(document_id, "document service: add");
        let meta = self.client.fetch_metadata(document_id).await?;
        let attachment = meta
            .latest_attachment()
            .cloned()
            .ok_or_else(|| Error::validation("document has no attachments"))?;
        let file_bytes = self.client.fetch_file(&attachment.file_path).await?;

        let indexer = Arc::clone(&self.indexer);
        tokio::task::spawn_blocking(move || indexer.index(&meta, &file_bytes))
            .await
            .map_err(|err| Error::Index(IndexError::TaskPanicked(err.to_string())))?
    }

    /// Delegates to the retriever's overview query.
    ///
    /// # Errors
    ///
    /// See [`MultiStageRetriever::overview_query`].
    pub fn overview_query(&self, req: &QueryRequest) -> Result<OverviewQueryResponse> {
        self.retriever.overview_query(req)
    }

    /// Delegates to the retriever's chunk query.
    ///
    /// # Errors
    ///
    /// See [`MultiStageRetriever::chunk_query`].
    pub fn chunk_query(&self, req: &QueryRequest) -> Result<ChunkQueryResponse> {
        self.retriever.chunk_query(req)
    }
}

/// Repository-artifact service: ingestion plus overview/chunk queries.
pub struct RepositoryService {
    client: Arc<dyn RepositoryServiceClient>,
    indexer: Arc<RepositoryIndexer>,
    retriever: MultiStageRetriever,
}

impl RepositoryService {
    /// Builds a repository service from its client and pipeline
    /// collaborators.
    #[must_use]
    pub fn new(
        client: Arc<dyn RepositoryServiceClient>,
        indexer: RepositoryIndexer,
        retriever: MultiStageRetriever,
    ) -> Self {
        Self {
            client,
            indexer: Arc::new(indexer),
            retriever,
        }
    }

    /// Returns the process-wide singleton, constructing it with `init` on
    /// first access. Subsequent calls ignore `init` and return the
    /// already-built instance.
    pub fn global(init: impl FnOnce() -> Self) -> Arc<Self> {
        Arc::clone(REPOSITORY_SERVICE.get_or_init(|| Arc::new(init())))
    }

    /// Fetches `repository_id`'s metadata and archive bytes for `branch`
    /// (or the repository's declared default branch if `None`), then
    /// indexes it on the worker pool.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `branch` is `None` and the repository
    /// declares no default branch. Propagates
    /// [`crate::error::ClientError`] from the fetch step, or any error the
    /// synchronous [`RepositoryIndexer::index`] raises (including a
    /// worker-pool panic, wrapped as [`IndexError::TaskPanicked`]).
    pub async fn add(&self, repository_id: &str, branch: Option<&str>) -> Result<RepositoryIndexResult> {
        tracing::info!(repository_id, branch, "repository service: add");
        let meta = self.client.fetch_metadata(repository_id).await?;
        let resolved_branch = branch
            .map(ToString::to_string)
            .or_else(|| meta.default_branch().map(ToString::to_string))
            .ok_or_else(|| Error::validation("repository has no default branch"))?;

        let archive_bytes = match branch {
            Some(explicit) => self.client.download_branch(repository_id, explicit).await?,
            None => self.client.download_default_branch(repository_id).await?,
        };

        let indexer = Arc::clone(&self.indexer);
        let repository_id_owned = repository_id.to_string();
        let branch_owned = resolved_branch;
        tokio::task::spawn_blocking(move || indexer.index(&repository_id_owned, &branch_owned, &archive_bytes))
            .await
            .map_err(|err| Error::Index(IndexError::TaskPanicked(err.to_string())))?
    }

    /// Delegates to the retriever's overview query.
    ///
    /// # Errors
    ///
    /// See [`MultiStageRetriever::overview_query`].
    pub fn overview_query(&self, req: &QueryRequest) -> Result<OverviewQueryResponse> {
        self.retriever.overview_query(req)
    }

    /// Delegates to the retriever's chunk query.
    ///
    /// # Errors
    ///
    /// See [`MultiStageRetriever::chunk_query`].
    pub fn chunk_query(&self, req: &QueryRequest) -> Result<ChunkQueryResponse> {
        self.retriever.chunk_query(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::LocalArtifactSource;
    use crate::core::{ArtifactClass, DocumentAttachment, DocumentMetadata, RepositoryBranch, RepositoryMetadata};
    use crate::embedding::FallbackEmbedder;
    use crate::overview::OverviewBuilder;
    use crate::rerank::LexicalOverlapReranker;
    use crate::retrieve::RetrieverConfig;
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

    #[tokio::test]
    async fn test_document_service_add_then_query_round_trip() {
        let store = Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap());
        let source = Arc::new(LocalArtifactSource::new());
        source.seed_document(
            DocumentMetadata {
                document_id: "doc-1".to_string(),
                attachments: vec![DocumentAttachment {
                    file_path: "/files/doc-1".to_string(),
                    file_name: "notes.md".to_string(),
                    mime_type: "text/markdown".to_string(),
                    order: 0,
                }],
            },
            [(
                "/files/doc-1".to_string(),
                format!("# Notes\n{}", "rust retrieval engine ".repeat(100)).into_bytes(),
            )],
        );

        let indexer = DocumentIndexer::new(overview_builder(), Arc::clone(&store));
        let retriever = MultiStageRetriever::new(
            ArtifactClass::Document,
            Arc::clone(&store),
            Arc::new(LexicalOverlapReranker::new()),
            hybrid_summarizer(),
            RetrieverConfig::default(),
        );
        let service = DocumentService::new(source, indexer, retriever);

        let result = service.add("doc-1").await.unwrap();
        assert_eq!(result.artifact_id, "doc-1");
        assert!(result.chunk_count > 0);

        let req = QueryRequest::new("rust retrieval engine");
        let resp = service.chunk_query(&req).unwrap();
        assert!(!resp.hits.is_empty());
    }

    #[tokio::test]
    async fn test_document_service_add_unknown_document_is_client_error() {
        let store = Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap());
        let indexer = DocumentIndexer::new(overview_builder(), Arc::clone(&store));
        let retriever = MultiStageRetriever::new(
            ArtifactClass::Document,
            store,
            Arc::new(LexicalOverlapReranker::new()),
            hybrid_summarizer(),
            RetrieverConfig::default(),
        );
        let service = DocumentService::new(Arc::new(LocalArtifactSource::new()), indexer, retriever);

        let err = service.add("missing-doc").await.unwrap_err();
        assert!(matches!(err, Error::Client(_)));
    }

    #[tokio::test]
    async fn test_repository_service_add_resolves_default_branch() {
        let store = Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap());
        let source = Arc::new(LocalArtifactSource::new());

        let mut archive_bytes = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut archive_bytes);
            let mut writer = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("src/lib.rs", options).unwrap();
            std::io::Write::write_all(&mut writer, b"fn lib() {}").unwrap();
            writer.finish().unwrap();
        }
        source.seed_repository(
            RepositoryMetadata {
                repository_id: "repo-1".to_string(),
                branches: vec![RepositoryBranch {
                    name: "main".to_string(),
                    default_branch: true,
                }],
            },
            "main",
            archive_bytes,
        );

        let indexer = RepositoryIndexer::new(overview_builder(), Arc::clone(&store));
        let retriever = MultiStageRetriever::new(
            ArtifactClass::Repository,
            store,
            Arc::new(LexicalOverlapReranker::new()),
            hybrid_summarizer(),
            RetrieverConfig::default(),
        );
        let service = RepositoryService::new(source, indexer, retriever);

        let result = service.add("repo-1", None).await.unwrap();
        assert_eq!(result.artifact_id, "repo-1");
        assert_eq!(result.indexed_files.len(), 1);
    }

    #[test]
    fn test_global_singleton_returns_same_instance_across_calls() {
        let store = Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).unwrap());
        let build = || {
            DocumentService::new(
                Arc::new(LocalArtifactSource::new()),
                DocumentIndexer::new(overview_builder(), Arc::clone(&store)),
                MultiStageRetriever::new(
                    ArtifactClass::Document,
                    Arc::clone(&store),
                    Arc::new(LexicalOverlapReranker::new()),
                    hybrid_summarizer(),
                    RetrieverConfig::default(),
                ),
            )
        };
        let first = DocumentService::global(build);
        let second = DocumentService::global(build);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
