//! Chunking strategies.
//!
//! Two chunkers cover the two supported artifact classes:
//!
//! - [`DocumentChunker`]: word-level sliding windows over markdown/text,
//!   splitting first on headings and re-splitting oversized sections on
//!   blank lines.
//! - [`RepositoryChunker`]: character-level sliding windows over each
//!   source file extracted from a repository archive.

pub mod document;
pub mod repository;
pub mod traits;

pub use document::DocumentChunker;
pub use repository::{RepositoryChunker, REPO_INDEX_EXTS};
pub use traits::{ChunkerConfig, Chunker};
