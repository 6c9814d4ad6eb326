//! Indexer (spec.md §4.6).
//!
//! Orchestrates the write path per artifact: chunk, build an overview, and
//! persist both to the Vector Index Coordinator. Document indexing
//! re-raises write failures (two-phase, non-transactional: an overview
//! write failure leaves nothing persisted for that call since it precedes
//! the chunk write, but a chunk-write failure after a successful overview
//! write leaves the overview behind). Repository indexing instead logs and
//! skips per-file failures and returns a partial result, per spec.md §4.6
//! step 3-4.

use crate::archive;
use crate::chunking::{DocumentChunker, RepositoryChunker};
use crate::core::{ArtifactRef, Chunk, DocumentMetadata, Overview};
use crate::error::{ChunkingError, IndexError};
use crate::overview::{OverviewBuilder, RepositoryFile};
use crate::store::{CollectionName, VectorStore, WriteRecord};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// File extensions accepted for document ingestion (spec.md §4.6 step 2).
pub const DOCUMENT_ALLOWED_EXTS: &[&str] = &["md", "txt", "pdf", "docx", "html"];

/// Result of indexing a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIndexResult {
    /// Id of the indexed document.
    pub artifact_id: String,
    /// Id of the persisted overview (`"{artifactId}_overview"`).
    pub overview_id: String,
    /// Number of chunks written.
    pub chunk_count: usize,
}

/// Summary of one repository file that was chunked and written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedFileSummary {
    /// Path within the repository archive.
    pub path: String,
    /// Number of chunks written for this file.
    pub chunks: usize,
    /// Chunk id prefix callers can use to reconstruct individual chunk ids.
    pub id_prefix: String,
}

/// Result of indexing a repository archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIndexResult {
    /// Id of the indexed repository.
    pub artifact_id: String,
    /// Display name (the repository id; the Repository Service reports no
    /// separate display name).
    pub name: String,
    /// Per-file chunking summaries, one entry for every file that produced
    /// at least one chunk.
    pub indexed_files: Vec<IndexedFileSummary>,
    /// Id of the persisted overview, or `None` if overview generation or
    /// persistence failed (logged, partial result returned per spec.md
    /// §4.6 step 4).
    pub overview_id: Option<String>,
}

/// Indexes documents: one artifact with a single attachment.
pub struct DocumentIndexer {
    chunker: DocumentChunker,
    overview_builder: OverviewBuilder,
    store: Arc<VectorStore>,
}

impl DocumentIndexer {
    /// Builds a document indexer over `store`, using the default document
    /// chunker configuration.
    #[must_use]
    pub fn new(overview_builder: OverviewBuilder, store: Arc<VectorStore>) -> Self {
        Self {
            chunker: DocumentChunker::new(),
            overview_builder,
            store,
        }
    }

    /// Indexes `file_bytes` as the latest attachment of `meta`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::Error::Validation`]/[`ChunkingError::UnsupportedType`]
    /// if there is no attachment or its extension is unsupported,
    /// [`ChunkingError::EmptyContent`] if chunking produces nothing, or a
    /// [`crate::error::StoreError::WriteFailed`] if either write fails.
    pub fn index(&self, meta: &DocumentMetadata, file_bytes: &[u8]) -> Result<DocumentIndexResult> {
        let artifact_ref = ArtifactRef::resolve_document(meta)
            .ok_or_else(|| Error::validation("document has no attachments"))?;
        let attachment = match &artifact_ref {
            ArtifactRef::Document { attachment, .. } => attachment,
            ArtifactRef::Repository { .. } => return Err(Error::Index(IndexError::MissingArtifactId)),
        };
        validate_document_extension(&attachment.file_name)?;

        let document_id = artifact_ref.artifact_id().to_string();
        tracing::info!(document_id = %document_id, "indexing document");

        let text = RepositoryChunker::decode(file_bytes);
        let chunks = self.chunker.chunk(&document_id, &text)?;
        let chunk_texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        let overview = self
            .overview_builder
            .build_document_overview(&document_id, &chunk_texts)?;

        self.store
            .write(CollectionName::DocumentOverview, &[overview_to_write_record(&overview)])?;
        let chunk_records: Vec<WriteRecord> = chunks.iter().map(chunk_to_write_record).collect();
        self.store.write(CollectionName::DocumentChunk, &chunk_records)?;

        tracing::info!(document_id = %document_id, chunk_count = chunks.len(), "document indexed");
        Ok(DocumentIndexResult {
            artifact_id: document_id,
            overview_id: overview.overview_id,
            chunk_count: chunks.len(),
        })
    }
}

/// Indexes repository archives: many chunked files plus one README-first
/// overview.
pub struct RepositoryIndexer {
    chunker: RepositoryChunker,
    overview_builder: OverviewBuilder,
    store: Arc<VectorStore>,
}

impl RepositoryIndexer {
    /// Builds a repository indexer over `store`, using the default
    /// repository chunker configuration.
    #[must_use]
    pub fn new(overview_builder: OverviewBuilder, store: Arc<VectorStore>) -> Self {
        Self {
            chunker: RepositoryChunker::new(),
            overview_builder,
            store,
        }
    }

    /// Indexes `archive_bytes` for `repository_id` on `branch`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::IndexError::Archive`] if the bytes are not a
    /// valid zip archive. Per-file chunking failures are logged and
    /// skipped; overview persistence failures are logged, leaving
    /// `overview_id` as `None` in the returned result.
    pub fn index(&self, repository_id: &str, branch: &str, archive_bytes: &[u8]) -> Result<RepositoryIndexResult> {
        tracing::info!(repository_id, branch, "indexing repository");

        let extracted = archive::extract_files(archive_bytes)?;
        let indexable = archive::filter_indexable(extracted);

        let overview_files: Vec<RepositoryFile> = indexable
            .iter()
            .map(|f| RepositoryFile::new(f.path.clone(), f.bytes.clone()))
            .collect();

        let mut indexed_files = Vec::new();
        let mut total_chunks = 0usize;
        for file in indexable.iter().filter(|f| !crate::overview::is_readme_name(&f.path)) {
            match self.chunker.chunk(repository_id, &file.path, &file.bytes, Some(branch)) {
                Ok(chunks) => {
                    let records: Vec<WriteRecord> = chunks.iter().map(chunk_to_write_record).collect();
                    let chunk_count = records.len();
                    match self.store.write(CollectionName::RepositoryChunk, &records) {
                        Ok(()) => {
                            indexed_files.push(IndexedFileSummary {
                                path: file.path.clone(),
                                chunks: chunk_count,
                                id_prefix: format!("{repository_id}:{}:chunk:", file.path),
                            });
                            total_chunks += chunk_count;
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, path = %file.path, "failed to write repository chunks, skipping file");
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, path = %file.path, "failed to chunk repository file, skipping");
                }
            }
        }

        let overview_id = self
            .build_and_persist_overview(repository_id, &overview_files, total_chunks)
            .map(Some)
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, repository_id, "repository overview failed, returning partial result");
                None
            });

        tracing::info!(repository_id, file_count = indexed_files.len(), "repository indexed");
        Ok(RepositoryIndexResult {
            artifact_id: repository_id.to_string(),
            name: repository_id.to_string(),
            indexed_files,
            overview_id,
        })
    }

    fn build_and_persist_overview(
        &self,
        repository_id: &str,
        files: &[RepositoryFile],
        chunk_count: usize,
    ) -> Result<String> {
        let overview = self
            .overview_builder
            .build_repository_overview(repository_id, files, chunk_count)?;
        self.store
            .write(CollectionName::RepositoryOverview, &[overview_to_write_record(&overview)])?;
        Ok(overview.overview_id)
    }
}

fn validate_document_extension(file_name: &str) -> Result<()> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension {
        Some(ref ext) if DOCUMENT_ALLOWED_EXTS.contains(&ext.as_str()) => Ok(()),
        other => Err(ChunkingError::UnsupportedType {
            extension: other.unwrap_or_default(),
        }
        .into()),
    }
}

/// Builds a [`WriteRecord`] from a chunk, annotating its metadata with the
/// generic `type`/`artifactId` wire fields plus the class-specific
/// `artifactIdField` (`docId`/`repositoryId`) the retriever filters on.
fn chunk_to_write_record(chunk: &Chunk) -> WriteRecord {
    let mut meta = serde_json::to_value(&chunk.meta).unwrap_or(serde_json::Value::Null);
    if let serde_json::Value::Object(ref mut map) = meta {
        map.insert("type".to_string(), serde_json::Value::String("chunk".to_string()));
        map.insert(
            chunk.meta.source_kind.artifact_id_field().to_string(),
            serde_json::Value::String(chunk.meta.artifact_id.clone()),
        );
    }
    WriteRecord::new(chunk.chunk_id.clone(), chunk.content.clone(), meta)
}

/// Builds a [`WriteRecord`] from an overview, with the same metadata
/// annotation scheme as [`chunk_to_write_record`].
fn overview_to_write_record(overview: &Overview) -> WriteRecord {
    let mut meta = serde_json::json!({
        "type": "overview",
        "artifactId": overview.artifact_id,
        "source": overview.source.as_meta_string(),
        "chunkCount": overview.chunk_count,
    });
    if let serde_json::Value::Object(ref mut map) = meta {
        map.insert(
            overview.source_kind.artifact_id_field().to_string(),
            serde_json::Value::String(overview.artifact_id.clone()),
        );
    }
    WriteRecord::new(overview.overview_id.clone(), overview.content.clone(), meta)
}
