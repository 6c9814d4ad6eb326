//! Overview Builder (spec.md §4.4).
//!
//! Builds the single condensed [`crate::core::Overview`] persisted
//! alongside an artifact's chunks: a plain Hierarchical summary of chunk
//! texts for documents, and a README-first, size-ranked-files-second
//! strategy for repositories.

use crate::chunking::RepositoryChunker;
use crate::core::{ArtifactClass, Overview, OverviewSource};
use crate::summarize::HierarchicalSummarizer;
use crate::Result;

/// Maximum README length, in characters, kept verbatim before it is routed
/// through the Hierarchical Summarizer instead.
pub const README_MAX_CHARS: usize = 20_000;

/// Number of largest files considered when no README is present.
pub const GENERATED_OVERVIEW_FILE_COUNT: usize = 10;

/// Per-file character limit applied before files are handed to the
/// Hierarchical Summarizer in the no-README path.
pub const PER_FILE_LIMIT: usize = 5_000;

/// Number of (already-truncated) files concatenated when summarization
/// itself fails in the no-README path.
pub const CONCAT_FALLBACK_FILE_COUNT: usize = 5;

/// A single file of a repository archive, as seen by the overview builder:
/// just enough to rank files by size and decode their content, independent
/// of how the archive was unpacked.
#[derive(Debug, Clone)]
pub struct RepositoryFile {
    /// Path within the repository, as stored in the archive.
    pub path: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl RepositoryFile {
    /// Builds a repository file entry.
    #[must_use]
    pub const fn new(path: String, bytes: Vec<u8>) -> Self {
        Self { path, bytes }
    }
}

/// Builds artifact-level overviews for documents and repositories.
pub struct OverviewBuilder {
    hierarchical: HierarchicalSummarizer,
}

impl OverviewBuilder {
    /// Builds an overview builder using the given Hierarchical Summarizer.
    #[must_use]
    pub const fn new(hierarchical: HierarchicalSummarizer) -> Self {
        Self { hierarchical }
    }

    /// Builds a document overview: all chunk texts fed through the
    /// Hierarchical Summarizer.
    ///
    /// # Errors
    ///
    /// Propagates a summarizer error if the underlying stages raise (the
    /// built-in stages never do; see [`crate::summarize::AbstractiveSummarizer`]).
    pub fn build_document_overview(&self, document_id: &str, chunk_texts: &[String]) -> Result<Overview> {
        let content = self.hierarchical.summarize_chunks(chunk_texts)?;
        Ok(Overview::new(
            ArtifactClass::Document,
            document_id.to_string(),
            content,
            OverviewSource::Generated,
            chunk_texts.len(),
        ))
    }

    /// Builds a repository overview using the README-first, size-ranked
    /// fallback strategy described in spec.md §4.4.
    ///
    /// # Errors
    ///
    /// Never raises: concat-fallback absorbs summarizer failure in the
    /// no-README path, matching the documented failure policy.
    pub fn build_repository_overview(
        &self,
        repository_id: &str,
        files: &[RepositoryFile],
        chunk_count: usize,
    ) -> Result<Overview> {
        if let Some(readme) = find_readme(files) {
            return self.build_from_readme(repository_id, readme, chunk_count);
        }
        self.build_generated(repository_id, files, chunk_count)
    }

    fn build_from_readme(
        &self,
        repository_id: &str,
        readme: &RepositoryFile,
        chunk_count: usize,
    ) -> Result<Overview> {
        let text = RepositoryChunker::decode(&readme.bytes);
        let content = if text.chars().count() <= README_MAX_CHARS {
            text
        } else {
            self.hierarchical.summarize_chunks(std::slice::from_ref(&text))?
        };
        Ok(Overview::new(
            ArtifactClass::Repository,
            repository_id.to_string(),
            content,
            OverviewSource::Readme(readme.path.clone()),
            chunk_count,
        ))
    }

    fn build_generated(
        &self,
        repository_id: &str,
        files: &[RepositoryFile],
        chunk_count: usize,
    ) -> Result<Overview> {
        let mut ranked: Vec<&RepositoryFile> = files.iter().collect();
        ranked.sort_by(|a, b| b.bytes.len().cmp(&a.bytes.len()));
        ranked.truncate(GENERATED_OVERVIEW_FILE_COUNT);

        let truncated: Vec<String> = ranked
            .iter()
            .map(|file| truncate_chars(&RepositoryChunker::decode(&file.bytes), PER_FILE_LIMIT))
            .collect();

        match self.hierarchical.summarize_chunks(&truncated) {
            Ok(content) => Ok(Overview::new(
                ArtifactClass::Repository,
                repository_id.to_string(),
                content,
                OverviewSource::Generated,
                chunk_count,
            )),
            Err(err) => {
                tracing::warn!(error = %err, %repository_id, "overview summarization failed, using concat fallback");
                let content = truncated
                    .iter()
                    .take(CONCAT_FALLBACK_FILE_COUNT)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Ok(Overview::new(
                    ArtifactClass::Repository,
                    repository_id.to_string(),
                    content,
                    OverviewSource::ConcatFallback,
                    chunk_count,
                ))
            }
        }
    }
}

fn find_readme(files: &[RepositoryFile]) -> Option<&RepositoryFile> {
    files.iter().find(|f| is_readme_name(&f.path))
}

pub(crate) fn is_readme_name(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    name == "readme" || name == "readme.md" || name == "readme.txt" || name == "readme.rst"
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
