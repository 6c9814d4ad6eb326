//! Chunk representation.
//!
//! A chunk is a segment of an artifact's content produced by a chunking
//! strategy, carrying enough metadata for the store and retriever to
//! reconstruct its provenance without re-reading the source artifact.

use super::artifact::ArtifactClass;
use serde::{Deserialize, Serialize};

/// A chunk of content taken from a document or repository file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Unique id, stable across re-indexing (`"{artifactId}_{index}"` for
    /// documents, `"{artifactId}:{filePath}:chunk:{index}"` for
    /// repositories).
    pub chunk_id: String,

    /// Chunk content.
    pub content: String,

    /// Sequential index within its source unit (0-based).
    pub chunk_index: usize,

    /// Total number of chunks produced from the same source unit.
    pub total_chunks: usize,

    /// Structured metadata.
    pub meta: ChunkMeta,
}

/// Metadata attached to a [`Chunk`], stored alongside its embedding vector
/// in the chunk collection and used to build filter predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMeta {
    /// Artifact class this chunk was produced from.
    pub source_kind: ArtifactClass,

    /// Id of the artifact (document or repository) this chunk belongs to.
    pub artifact_id: String,

    /// Path within the repository archive, or the document's filename for
    /// document chunks.
    pub file_path: String,

    /// Whether this chunk overlaps with its predecessor in the same file.
    pub has_overlap: bool,

    /// SHA-256 hex digest of the source file's full content (repository
    /// chunks only; `None` for document chunks).
    pub content_hash: Option<String>,

    /// Guessed MIME type of the source file (repository chunks only).
    pub mime_type: Option<String>,

    /// Size in bytes of the source file this chunk was produced from.
    pub file_size: usize,

    /// Branch the repository archive was taken from (repository chunks
    /// only; `None` for document chunks).
    pub branch: Option<String>,
}

impl Chunk {
    /// Builds a chunk with a deterministic id for a document.
    #[must_use]
    pub fn for_document(
        document_id: &str,
        content: String,
        chunk_index: usize,
        total_chunks: usize,
    ) -> Self {
        let file_size = content.len();
        Self {
            chunk_id: format!("{document_id}_{chunk_index}"),
            content,
            chunk_index,
            total_chunks,
            meta: ChunkMeta {
                source_kind: ArtifactClass::Document,
                artifact_id: document_id.to_string(),
                file_path: document_id.to_string(),
                has_overlap: false,
                content_hash: None,
                mime_type: None,
                file_size,
                branch: None,
            },
        }
    }

    /// Builds a chunk with a deterministic id for a repository file.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn for_repository_file(
        repository_id: &str,
        file_path: &str,
        content: String,
        chunk_index: usize,
        total_chunks: usize,
        content_hash: String,
        mime_type: String,
        file_size: usize,
        branch: Option<String>,
    ) -> Self {
        Self {
            chunk_id: format!("{repository_id}:{file_path}:chunk:{chunk_index}"),
            content,
            chunk_index,
            total_chunks,
            meta: ChunkMeta {
                source_kind: ArtifactClass::Repository,
                artifact_id: repository_id.to_string(),
                file_path: file_path.to_string(),
                has_overlap: false,
                content_hash: Some(content_hash),
                mime_type: Some(mime_type),
                file_size,
                branch,
            },
        }
    }

    /// Marks this chunk as overlapping with its predecessor.
    pub const fn set_has_overlap(&mut self, has_overlap: bool) {
        self.meta.has_overlap = has_overlap;
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Returns `true` if the chunk carries no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Estimates token count using the ~4-characters-per-token heuristic,
    /// consistent with the chunkers' sizing target.
    #[must_use]
    pub fn estimate_tokens(&self) -> usize {
        self.content.len().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_for_document_id_format() {
        let chunk = Chunk::for_document("doc-1", "hello".to_string(), 0, 3);
        assert_eq!(chunk.chunk_id, "doc-1_0");
        assert_eq!(chunk.meta.source_kind, ArtifactClass::Document);
        assert_eq!(chunk.total_chunks, 3);
    }

    #[test]
    fn test_chunk_for_repository_file_id_format() {
        let chunk = Chunk::for_repository_file(
            "repo-1",
            "src/main.rs",
            "fn main() {}".to_string(),
            0,
            1,
            "deadbeef".to_string(),
            "text/x-rust".to_string(),
            12,
            Some("main".to_string()),
        );
        assert_eq!(chunk.chunk_id, "repo-1:src/main.rs:chunk:0");
        assert_eq!(chunk.meta.content_hash.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_chunk_set_has_overlap() {
        let mut chunk = Chunk::for_document("doc-1", "x".to_string(), 1, 2);
        assert!(!chunk.meta.has_overlap);
        chunk.set_has_overlap(true);
        assert!(chunk.meta.has_overlap);
    }

    #[test]
    fn test_chunk_estimate_tokens() {
        let chunk = Chunk::for_document("doc-1", "Hello, world!".to_string(), 0, 1);
        assert!(chunk.estimate_tokens() >= 3);
        assert!(chunk.estimate_tokens() <= 4);
    }

    #[test]
    fn test_chunk_serialization_roundtrip() {
        let chunk = Chunk::for_document("doc-1", "test".to_string(), 0, 1);
        let json = serde_json::to_string(&chunk).unwrap();
        let back: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, "test");
    }
}
