//! Chunker trait and shared configuration.

use crate::core::Chunk;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Trait for turning an artifact's raw content into a sequence of [`Chunk`]s.
///
/// Implementations must be `Send + Sync`: the indexer dispatches chunking
/// to a blocking worker pool, so a chunker may be invoked from any thread.
pub trait Chunker: Send + Sync {
    /// Returns the name of the chunking strategy (`"document"` or
    /// `"repository"`).
    fn name(&self) -> &'static str;

    /// Validates a configuration before chunking.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero or `overlap >= chunk_size`.
    fn validate(&self, config: &ChunkerConfig) -> Result<()> {
        if config.chunk_size == 0 {
            return Err(crate::error::ChunkingError::InvalidConfig {
                reason: "chunk_size must be > 0".to_string(),
            }
            .into());
        }
        if config.overlap >= config.chunk_size {
            return Err(crate::error::ChunkingError::OverlapTooLarge {
                overlap: config.overlap,
                size: config.chunk_size,
            }
            .into());
        }
        Ok(())
    }
}

/// Sliding-window configuration shared by both chunkers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ChunkerConfig {
    /// Target chunk size (words for documents, characters for repository
    /// files).
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in the same unit as `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkerConfig {
    /// Document chunker default: 400-word windows with 50-word overlap.
    pub const DOCUMENT_DEFAULT: Self = Self {
        chunk_size: 400,
        overlap: 50,
    };

    /// Repository chunker default: 2000-character windows with 200-character
    /// overlap.
    pub const REPOSITORY_DEFAULT: Self = Self {
        chunk_size: 2_000,
        overlap: 200,
    };

    /// Creates a configuration using the document defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self::DOCUMENT_DEFAULT
    }

    /// Creates a configuration with a custom size and no overlap.
    #[must_use]
    pub const fn with_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            overlap: 0,
        }
    }

    /// Creates a configuration with a custom size and overlap.
    #[must_use]
    pub const fn with_size_and_overlap(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    struct Probe;
    impl Chunker for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }
    }

    #[test]
    fn test_document_default() {
        let config = ChunkerConfig::DOCUMENT_DEFAULT;
        assert_eq!(config.chunk_size, 400);
        assert_eq!(config.overlap, 50);
    }

    #[test]
    fn test_repository_default() {
        let config = ChunkerConfig::REPOSITORY_DEFAULT;
        assert_eq!(config.chunk_size, 2_000);
        assert_eq!(config.overlap, 200);
    }

    #[test]
    fn test_with_size_and_overlap() {
        let config = ChunkerConfig::with_size_and_overlap(100, 10);
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.overlap, 10);
    }

    #[test_case(400, 50, true; "document default is valid")]
    #[test_case(2_000, 200, true; "repository default is valid")]
    #[test_case(100, 0, true; "zero overlap is valid")]
    #[test_case(0, 0, false; "zero chunk size is invalid")]
    #[test_case(100, 100, false; "overlap equal to chunk size is invalid")]
    #[test_case(100, 150, false; "overlap larger than chunk size is invalid")]
    fn test_validate_accepts_or_rejects_config(chunk_size: usize, overlap: usize, expect_ok: bool) {
        let config = ChunkerConfig::with_size_and_overlap(chunk_size, overlap);
        assert_eq!(Probe.validate(&config).is_ok(), expect_ok);
    }
}
