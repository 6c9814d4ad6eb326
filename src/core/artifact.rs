//! Artifact identity and payload types.
//!
//! An artifact is either a document (a single attached file, selected as
//! the attachment with the highest `order`) or a repository (a zip
//! archive of source files on a named branch). Both are addressed by a
//! caller-supplied id; [`ArtifactRef`] is the ephemeral identity spec.md
//! §3 describes, constructed fresh per request and never persisted.

use serde::{Deserialize, Serialize};

/// Which of the two supported artifact classes a reference identifies.
///
/// Each class gets its own pair of vector collections (overview + chunk);
/// see the `store` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactClass {
    /// A single attached document (markdown, text, PDF-extracted text, etc).
    Document,
    /// A repository archive containing many source files.
    Repository,
}

impl ArtifactClass {
    /// Returns the lowercase name used as a collection-name prefix
    /// (`"document"` / `"repository"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Repository => "repository",
        }
    }

    /// Returns the metadata field name a [`crate::core::FilterNode`] uses
    /// to scope a search to specific artifact ids within this class
    /// (`doc_id` for documents, `repository_id` for repositories, per
    /// spec.md §4.7).
    #[must_use]
    pub const fn artifact_id_field(self) -> &'static str {
        match self {
            Self::Document => "doc_id",
            Self::Repository => "repository_id",
        }
    }
}

impl std::fmt::Display for ArtifactClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attachment on a document. A document may have several (e.g.
/// revisions); the Indexer always selects the one with the highest
/// `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAttachment {
    /// Path the Document Service serves this attachment's bytes from.
    pub file_path: String,
    /// Original filename, used for extension validation and MIME guessing.
    pub file_name: String,
    /// MIME type reported by the Document Service.
    pub mime_type: String,
    /// Ordering key; the attachment with the maximum `order` is "latest".
    pub order: i64,
}

/// Metadata for a document as reported by the Document Service: an id
/// plus every known attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Caller-supplied document id. Stable across re-indexing.
    pub document_id: String,
    /// All attachments known for this document.
    pub attachments: Vec<DocumentAttachment>,
}

impl DocumentMetadata {
    /// Returns the attachment with the maximum `order`, per spec.md §3's
    /// "latest attachment" invariant. `None` if there are no attachments.
    #[must_use]
    pub fn latest_attachment(&self) -> Option<&DocumentAttachment> {
        self.attachments.iter().max_by_key(|a| a.order)
    }
}

/// A repository branch descriptor as reported by the Repository Service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryBranch {
    /// Branch name.
    pub name: String,
    /// Whether the Repository Service marks this as the default branch.
    pub default_branch: bool,
}

/// Repository metadata as reported by the Repository Service: an id plus
/// its known branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryMetadata {
    /// Caller-supplied repository id. Stable across re-indexing.
    pub repository_id: String,
    /// Known branches.
    pub branches: Vec<RepositoryBranch>,
}

impl RepositoryMetadata {
    /// Resolves the default branch: the first branch with
    /// `defaultBranch=true`, per spec.md §3. Repositories with no branch
    /// marked default have no resolvable default.
    #[must_use]
    pub fn default_branch(&self) -> Option<&str> {
        self.branches
            .iter()
            .find(|b| b.default_branch)
            .map(|b| b.name.as_str())
    }
}

/// Identity of an ingestable unit, constructed fresh per request and
/// never persisted (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ArtifactRef {
    /// A document and its resolved latest attachment.
    Document {
        /// Document id.
        document_id: String,
        /// The attachment selected as "latest" (maximum `order`).
        attachment: DocumentAttachment,
    },
    /// A repository and the branch its archive was taken from.
    Repository {
        /// Repository id.
        repository_id: String,
        /// Resolved branch name (explicit, or the repository's default).
        branch: String,
    },
}

impl ArtifactRef {
    /// Builds a document [`ArtifactRef`] from metadata, selecting the
    /// latest attachment.
    #[must_use]
    pub fn resolve_document(meta: &DocumentMetadata) -> Option<Self> {
        meta.latest_attachment().map(|attachment| Self::Document {
            document_id: meta.document_id.clone(),
            attachment: attachment.clone(),
        })
    }

    /// Builds a repository [`ArtifactRef`], using the explicit `branch`
    /// when given, otherwise the repository's declared default branch.
    #[must_use]
    pub fn resolve_repository(meta: &RepositoryMetadata, branch: Option<&str>) -> Option<Self> {
        let branch = branch
            .map(ToString::to_string)
            .or_else(|| meta.default_branch().map(ToString::to_string))?;
        Some(Self::Repository {
            repository_id: meta.repository_id.clone(),
            branch,
        })
    }

    /// Returns this reference's artifact class.
    #[must_use]
    pub const fn class(&self) -> ArtifactClass {
        match self {
            Self::Document { .. } => ArtifactClass::Document,
            Self::Repository { .. } => ArtifactClass::Repository,
        }
    }

    /// Returns the artifact id, regardless of class.
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        match self {
            Self::Document { document_id, .. } => document_id,
            Self::Repository { repository_id, .. } => repository_id,
        }
    }
}
