//! Repository chunker: character-level sliding windows over source files.

use super::traits::{ChunkerConfig, Chunker};
use crate::core::Chunk;
use crate::error::{ChunkingError, Result};
use sha2::{Digest, Sha256};

/// File extensions eligible for indexing. Anything else is skipped by the
/// repository indexer before it reaches the chunker. `dockerfile` matches
/// an extensionless `Dockerfile` by the indexer's lowercase-filename
/// fallback, not by extension.
pub const REPO_INDEX_EXTS: &[&str] = &[
    "java", "kt", "xml", "yml", "yaml", "properties", "md", "txt", "py", "js", "ts", "json",
    "html", "css", "gradle", "groovy", "pom", "sql", "sh", "bash", "dockerfile",
];

/// Chunks repository source files into overlapping character windows,
/// preferring line/word boundaries near the target window edge.
#[derive(Debug, Clone)]
pub struct RepositoryChunker {
    config: ChunkerConfig,
}

impl Default for RepositoryChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryChunker {
    /// Creates a repository chunker using [`ChunkerConfig::REPOSITORY_DEFAULT`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: ChunkerConfig::REPOSITORY_DEFAULT,
        }
    }

    /// Creates a repository chunker with a custom configuration.
    #[must_use]
    pub const fn with_config(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Decodes raw file bytes as UTF-8, falling back to a lossy Latin-1
    /// decoding (each byte mapped to its Unicode codepoint) when the bytes
    /// aren't valid UTF-8, so no file is ever skipped for encoding reasons.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
    }

    /// Chunks a single repository file's content.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::EmptyContent`] for a blank file, and
    /// configuration errors per [`Chunker::validate`].
    pub fn chunk(
        &self,
        repository_id: &str,
        file_path: &str,
        bytes: &[u8],
        branch: Option<&str>,
    ) -> Result<Vec<Chunk>> {
        self.validate(&self.config)?;

        if bytes.is_empty() {
            return Err(ChunkingError::EmptyContent {
                source: file_path.to_string(),
            }
            .into());
        }

        let text = Self::decode(bytes);
        if text.trim().is_empty() {
            return Err(ChunkingError::EmptyContent {
                source: file_path.to_string(),
            }
            .into());
        }

        let digest = Sha256::digest(bytes);
        let content_hash = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        let mime_type = mime_guess::from_path(file_path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();

        let windows = self.window_chars(&text);
        let total = windows.len();
        let mut chunks = Vec::with_capacity(total);
        for (index, content) in windows.into_iter().enumerate() {
            let mut chunk = Chunk::for_repository_file(
                repository_id,
                file_path,
                content,
                index,
                total,
                content_hash.clone(),
                mime_type.clone(),
                bytes.len(),
                branch.map(ToString::to_string),
            );
            if index > 0 && self.config.overlap > 0 {
                chunk.set_has_overlap(true);
            }
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    /// Splits text into overlapping character (Unicode scalar) windows of
    /// `chunk_size` characters, stepping by `chunk_size - overlap`
    /// (clamped to at least 1 character per step).
    fn window_chars(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.config.chunk_size {
            return vec![text.to_string()];
        }

        let step = (self.config.chunk_size - self.config.overlap).max(1);
        let mut windows = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.config.chunk_size).min(chars.len());
            windows.push(chars[start..end].iter().collect());
            if end >= chars.len() {
                break;
            }
            start += step;
        }
        windows
    }
}

impl Chunker for RepositoryChunker {
    fn name(&self) -> &'static str {
        "repository"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_utf8() {
        assert_eq!(RepositoryChunker::decode(b"hello"), "hello");
    }

    #[test]
    fn test_decode_invalid_utf8_falls_back() {
        let bytes = vec![0xff, 0xfe, b'a'];
        let decoded = RepositoryChunker::decode(&bytes);
        assert_eq!(decoded.chars().count(), 3);
    }

    #[test]
    fn test_chunk_empty_file_errors() {
        let chunker = RepositoryChunker::new();
        let err = chunker.chunk("repo-1", "empty.txt", b"", None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_chunk_small_file_single_chunk() {
        let chunker = RepositoryChunker::new();
        let chunks = chunker
            .chunk("repo-1", "src/main.rs", b"fn main() {}", None)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "repo-1:src/main.rs:chunk:0");
        assert_eq!(chunks[0].meta.mime_type.as_deref(), Some("text/x-rust"));
    }

    #[test]
    fn test_chunk_large_file_produces_overlap() {
        let chunker =
            RepositoryChunker::with_config(ChunkerConfig::with_size_and_overlap(100, 20));
        let content = "x".repeat(500);
        let chunks = chunker
            .chunk("repo-1", "data.txt", content.as_bytes(), None)
            .unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks[1].meta.has_overlap);
    }

    #[test]
    fn test_repo_index_exts_contains_common_types() {
        assert!(REPO_INDEX_EXTS.contains(&"py"));
        assert!(REPO_INDEX_EXTS.contains(&"md"));
        assert!(!REPO_INDEX_EXTS.contains(&"exe"));
    }
}
