//! Artifact-level overview representation.

use super::artifact::ArtifactClass;
use serde::{Deserialize, Serialize};

/// Where an [`Overview`]'s content came from, per the Overview Builder's
/// priority order (spec.md §4.4): a verbatim/summarized README, a
/// generated summary over the largest files, or a last-resort
/// concatenation when summarization itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewSource {
    /// Verbatim or summarized README found at this path within the
    /// artifact.
    Readme(String),
    /// No README was found; content was generated from the top-N largest
    /// files.
    Generated,
    /// Summarization failed; content is a truncated concatenation
    /// fallback.
    ConcatFallback,
}

impl OverviewSource {
    /// Renders the `meta.source` wire value used by spec.md §4.4 (the
    /// README path itself, or the literal `"generated"`/`"concat_fallback"`
    /// tags).
    #[must_use]
    pub fn as_meta_string(&self) -> String {
        match self {
            Self::Readme(path) => path.clone(),
            Self::Generated => "generated".to_string(),
            Self::ConcatFallback => "concat_fallback".to_string(),
        }
    }
}

/// A single summary of an entire artifact, stored in the overview
/// collection alongside its embedding vector. Overview search scopes
/// which artifacts a chunk search should then range over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Id, always `"{artifactId}_overview"`.
    pub overview_id: String,
    /// Artifact class this overview summarizes.
    pub source_kind: ArtifactClass,
    /// Id of the summarized artifact.
    pub artifact_id: String,
    /// Overview text (hierarchical/hybrid summary, or verbatim README).
    pub content: String,
    /// Where the content came from.
    pub source: OverviewSource,
    /// Number of chunks produced for this artifact (0 for documents
    /// summarized purely from their own chunk texts before chunks are
    /// written, filled in by the Indexer once both are known).
    pub chunk_count: usize,
}

impl Overview {
    /// Builds a new overview record, deriving `overview_id` from
    /// `artifact_id` per spec.md §3's `"<artifactId>_overview"` rule.
    #[must_use]
    pub fn new(
        source_kind: ArtifactClass,
        artifact_id: String,
        content: String,
        source: OverviewSource,
        chunk_count: usize,
    ) -> Self {
        Self {
            overview_id: format!("{artifact_id}_overview"),
            source_kind,
            artifact_id,
            content,
            source,
            chunk_count,
        }
    }
}
