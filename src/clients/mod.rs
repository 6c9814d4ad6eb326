//! Outbound client contracts (spec.md §6, SPEC_FULL.md §6/§11).
//!
//! The Document Service, Repository Service, and identity provider are
//! modeled as trait contracts only: no HTTP implementation ships in this
//! crate. [`LocalArtifactSource`] is the one concrete implementation, an
//! in-memory/local-filesystem test double used by the test suite and the
//! dev CLI so `DocumentService::add`/`RepositoryService::add` can be
//! exercised end-to-end without a network dependency.

use crate::core::{DocumentMetadata, RepositoryMetadata};
use crate::error::ClientError;
use crate::tool::ToolDescriptor;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Outbound contract for the Document Service: metadata and attachment
/// bytes for a given document id.
#[async_trait]
pub trait DocumentServiceClient: Send + Sync {
    /// Fetches a document's metadata (id plus known attachments).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the id is unknown, or
    /// [`ClientError::Http`]/[`ClientError::Network`] for upstream failures.
    async fn fetch_metadata(&self, id: &str) -> Result<DocumentMetadata>;

    /// Fetches the raw bytes of an attachment at `file_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the path is unknown, or
    /// [`ClientError::Http`]/[`ClientError::Network`] for upstream failures.
    async fn fetch_file(&self, file_path: &str) -> Result<Vec<u8>>;
}

/// Outbound contract for the Repository Service: metadata and archive
/// bytes for a given repository id.
///
/// `download_default_branch` and `download_branch` are kept as two
/// distinctly named methods rather than one overloaded on an
/// `Option<&str>` branch argument, per SPEC_FULL.md §9's resolution.
#[async_trait]
pub trait RepositoryServiceClient: Send + Sync {
    /// Fetches a repository's metadata (id plus known branches).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the id is unknown, or
    /// [`ClientError::Http`]/[`ClientError::Network`] for upstream failures.
    async fn fetch_metadata(&self, id: &str) -> Result<RepositoryMetadata>;

    /// Downloads a zip archive of the repository's declared default branch.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the repository has no default
    /// branch, or [`ClientError::Http`]/[`ClientError::Network`] for
    /// upstream failures.
    async fn download_default_branch(&self, id: &str) -> Result<Vec<u8>>;

    /// Downloads a zip archive of the named branch.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the branch is unknown, or
    /// [`ClientError::Http`]/[`ClientError::Network`] for upstream failures.
    async fn download_branch(&self, id: &str, branch: &str) -> Result<Vec<u8>>;
}

/// Client-credentials identity token provider.
///
/// Contract only: no HTTP implementation. A future router layer would use
/// this to authenticate calls to the Document/Repository Services.
#[async_trait]
pub trait IdentityTokenProvider: Send + Sync {
    /// Returns a bearer token for outbound service calls.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] if the token endpoint is
    /// unreachable, or [`ClientError::Http`] for a non-2xx response.
    async fn token(&self) -> Result<String>;
}

/// Publishes a service's tool descriptors to an event bus, so external
/// discovery can see what tools `ToolRegistry` exposes.
#[async_trait]
pub trait ToolDescriptorPublisher: Send + Sync {
    /// Publishes `descriptors` under `service_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`]/[`ClientError::Http`] if the
    /// publish call fails.
    async fn publish(&self, service_name: &str, descriptors: &[ToolDescriptor]) -> Result<()>;
}

/// No-op [`ToolDescriptorPublisher`]: the default when no event bus is
/// configured. Always succeeds without doing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl ToolDescriptorPublisher for NoopPublisher {
    async fn publish(&self, _service_name: &str, _descriptors: &[ToolDescriptor]) -> Result<()> {
        Ok(())
    }
}

/// In-memory document/repository source backing [`LocalArtifactSource`].
#[derive(Debug, Clone, Default)]
struct LocalStore {
    documents: HashMap<String, DocumentMetadata>,
    document_files: HashMap<String, Vec<u8>>,
    repositories: HashMap<String, RepositoryMetadata>,
    repository_archives: HashMap<(String, String), Vec<u8>>,
}

/// Local-memory test double implementing [`DocumentServiceClient`] and
/// [`RepositoryServiceClient`] without any network dependency. Used by the
/// integration test suite and the dev CLI, which seed it directly rather
/// than fetching over HTTP.
#[derive(Debug, Default)]
pub struct LocalArtifactSource {
    inner: Mutex<LocalStore>,
}

impl LocalArtifactSource {
    /// Builds an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document's metadata and the bytes served for every one
    /// of its attachments (keyed by `file_path`).
    pub fn seed_document(&self, meta: DocumentMetadata, files: impl IntoIterator<Item = (String, Vec<u8>)>) {
        let mut inner = self.lock();
        for (path, bytes) in files {
            inner.document_files.insert(path, bytes);
        }
        inner.documents.insert(meta.document_id.clone(), meta);
    }

    /// Registers a repository's metadata and the zip archive bytes served
    /// for a given branch.
    pub fn seed_repository(&self, meta: RepositoryMetadata, branch: impl Into<String>, archive_bytes: Vec<u8>) {
        let mut inner = self.lock();
        let key = (meta.repository_id.clone(), branch.into());
        inner.repository_archives.insert(key, archive_bytes);
        inner.repositories.insert(meta.repository_id.clone(), meta);
    }

    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, LocalStore> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentServiceClient for LocalArtifactSource {
    async fn fetch_metadata(&self, id: &str) -> Result<DocumentMetadata> {
        self.lock()
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.to_string()).into())
    }

    async fn fetch_file(&self, file_path: &str) -> Result<Vec<u8>> {
        self.lock()
            .document_files
            .get(file_path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(file_path.to_string()).into())
    }
}

#[async_trait]
impl RepositoryServiceClient for LocalArtifactSource {
    async fn fetch_metadata(&self, id: &str) -> Result<RepositoryMetadata> {
        self.lock()
            .repositories
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.to_string()).into())
    }

    async fn download_default_branch(&self, id: &str) -> Result<Vec<u8>> {
        let branch = self
            .lock()
            .repositories
            .get(id)
            .and_then(RepositoryMetadata::default_branch)
            .map(ToString::to_string)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
        self.download_branch(id, &branch).await
    }

    async fn download_branch(&self, id: &str, branch: &str) -> Result<Vec<u8>> {
        self.lock()
            .repository_archives
            .get(&(id.to_string(), branch.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{id}@{branch}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DocumentAttachment, RepositoryBranch};

    fn doc_meta() -> DocumentMetadata {
        DocumentMetadata {
            document_id: "doc-1".to_string(),
            attachments: vec![DocumentAttachment {
                file_path: "/files/doc-1-v1".to_string(),
                file_name: "notes.md".to_string(),
                mime_type: "text/markdown".to_string(),
                order: 0,
            }],
        }
    }

    fn repo_meta() -> RepositoryMetadata {
        RepositoryMetadata {
            repository_id: "repo-1".to_string(),
            branches: vec![RepositoryBranch {
                name: "main".to_string(),
                default_branch: true,
            }],
        }
    }

    #[tokio::test]
    async fn test_fetch_metadata_and_file_roundtrip() {
        let source = LocalArtifactSource::new();
        source.seed_document(doc_meta(), [("/files/doc-1-v1".to_string(), b"hello".to_vec())]);

        let meta = DocumentServiceClient::fetch_metadata(&source, "doc-1").await.unwrap();
        assert_eq!(meta.document_id, "doc-1");
        let bytes = source.fetch_file("/files/doc-1-v1").await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_fetch_metadata_unknown_id_is_not_found() {
        let source = LocalArtifactSource::new();
        let err = DocumentServiceClient::fetch_metadata(&source, "missing").await.unwrap_err();
        assert!(matches!(err, crate::Error::Client(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_default_branch_resolves_declared_default() {
        let source = LocalArtifactSource::new();
        source.seed_repository(repo_meta(), "main", b"zip-bytes".to_vec());

        let bytes = source.download_default_branch("repo-1").await.unwrap();
        assert_eq!(bytes, b"zip-bytes");
    }

    #[tokio::test]
    async fn test_download_branch_unknown_branch_is_not_found() {
        let source = LocalArtifactSource::new();
        source.seed_repository(repo_meta(), "main", b"zip-bytes".to_vec());

        let err = source.download_branch("repo-1", "feature-x").await.unwrap_err();
        assert!(matches!(err, crate::Error::Client(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_noop_publisher_always_succeeds() {
        let publisher = NoopPublisher;
        let result = publisher.publish("document-service", &[]).await;
        assert!(result.is_ok());
    }
}
