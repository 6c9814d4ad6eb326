//! Error types for the retrieval engine.
//!
//! Layered `thiserror` hierarchy: a top-level [`Error`] wraps per-domain
//! errors for chunking, overview building, the vector store, model
//! inference, retrieval, indexing, the tool dispatcher, configuration,
//! I/O, and outbound clients.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all retrieval engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Vector store / coordinator errors.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Chunking-related errors.
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Overview-building errors.
    #[error("overview error: {0}")]
    Overview(#[from] OverviewError),

    /// Embedding / cross-encoder / summarizer model errors.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Multi-stage retrieval errors.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Indexing pipeline errors.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Tool dispatcher errors.
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Outbound client errors (document/repository services, identity provider).
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// I/O errors (file operations, archive reads).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors (dev harness only).
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Input validation errors.
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description of what failed validation.
        message: String,
    },
}

impl Error {
    /// Builds an [`Error::Validation`] with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if this error represents a validation (client) failure
    /// rather than an internal/upstream failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Chunking(ChunkingError::UnsupportedType { .. })
        )
    }
}

/// Vector store / coordinator errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Collection not initialized.
    #[error("collection not initialized: {collection}")]
    NotInitialized {
        /// Name of the uninitialized collection.
        collection: String,
    },

    /// A write to a collection failed. Per the two-phase overview-then-chunks
    /// write path, overview and chunk writes are not transactional with each
    /// other; a failure here is logged and re-raised rather than rolled back.
    #[error("write failed for collection {collection}: {reason}")]
    WriteFailed {
        /// Collection the write targeted.
        collection: String,
        /// Underlying reason.
        reason: String,
    },

    /// Serialization/deserialization of stored metadata failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A filter referenced a field name outside the allowed identifier charset.
    #[error("invalid filter field name: {field}")]
    InvalidFilterField {
        /// The rejected field name.
        field: String,
    },

    /// Vector search error (feature-gated HNSW backend).
    #[cfg(feature = "usearch-hnsw")]
    #[error("vector search error: {0}")]
    VectorSearch(String),
}

/// Chunking-specific errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// File extension / MIME type not supported for this artifact class.
    #[error("unsupported type: {extension}")]
    UnsupportedType {
        /// The offending extension or MIME type.
        extension: String,
    },

    /// Chunking a source produced zero chunks (e.g. the file was empty).
    #[error("empty content: {source}")]
    EmptyContent {
        /// Path or identifier of the empty source.
        source: String,
    },

    /// Invalid chunker configuration (size/overlap out of range).
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },

    /// Invalid UTF-8 encountered at a specific byte offset (repositories fall
    /// back to lossy Latin-1 decoding rather than raising this in practice).
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where invalid UTF-8 was found.
        offset: usize,
    },

    /// Frontmatter parsing failed.
    #[error("frontmatter parse error: {0}")]
    Frontmatter(String),

    /// Regex compilation error (heading / boundary detection patterns).
    #[error("regex error: {0}")]
    Regex(String),

    /// Parallel chunking batch failed.
    #[error("parallel processing failed: {reason}")]
    ParallelFailed {
        /// Reason for failure.
        reason: String,
    },
}

/// Overview-building errors.
#[derive(Error, Debug)]
pub enum OverviewError {
    /// No content was available to build an overview from.
    #[error("no content available to build overview for artifact {artifact_id}")]
    NoContent {
        /// The artifact the overview was being built for.
        artifact_id: String,
    },
}

/// Model inference errors (embedding / cross-encoder / summarizer).
///
/// Failures here are handled by per-component deterministic fallbacks and
/// are not meant to propagate to callers; this type gives the fallback
/// sites something concrete to catch, log, and recover from.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Embedding generation failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Cross-encoder scoring failed.
    #[error("cross-encoder prediction failed: {0}")]
    CrossEncoder(String),

    /// Summarization failed.
    #[error("summarization failed: {0}")]
    Summarization(String),
}

/// Multi-stage retrieval errors.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The query text was empty.
    #[error("query must not be empty")]
    EmptyQuery,
}

/// Indexing pipeline errors.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Failed to open/read a repository archive.
    #[error("archive error: {0}")]
    Archive(String),

    /// A document or repository id was missing or blank.
    #[error("missing artifact id")]
    MissingArtifactId,

    /// The worker-pool task running the Indexer panicked.
    #[error("indexing task panicked: {0}")]
    TaskPanicked(String),
}

/// Tool dispatcher errors.
#[derive(Error, Debug)]
pub enum ToolError {
    /// `req.toolId` was empty.
    #[error("tool id must not be empty")]
    EmptyToolId,

    /// No handler registered for the given tool id.
    #[error("unsupported tool id: {tool_id}")]
    UnknownTool {
        /// The requested tool id.
        tool_id: String,
    },

    /// Request params could not be coerced into the expected shape.
    #[error("invalid tool params: {0}")]
    InvalidParams(String),
}

/// Configuration loading/parsing errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No config file found at `CONFIG_PATH` or any well-known path.
    #[error("no configuration file found")]
    NotFound,

    /// The config file could not be read.
    #[error("failed to read config file {path}: {reason}")]
    ReadFailed {
        /// Path that failed to read.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// YAML parsing failed.
    #[error("failed to parse YAML config: {0}")]
    Parse(String),

    /// A `${models.*}`-style placeholder referenced an unknown key.
    #[error("unresolved config placeholder: {placeholder}")]
    UnresolvedPlaceholder {
        /// The unresolved placeholder expression.
        placeholder: String,
    },

    /// An environment-variable override could not be parsed as YAML.
    #[error("invalid override for key {key}: {reason}")]
    InvalidOverride {
        /// Dotted config key the override targeted.
        key: String,
        /// Underlying reason.
        reason: String,
    },
}

/// Outbound client contract errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx response from an upstream service.
    #[error("upstream HTTP error: status={status}, body={body}")]
    Http {
        /// HTTP status code returned.
        status: u16,
        /// Response body (truncated by the caller if large).
        body: String,
    },

    /// Network transport failure (timeout, connection reset, DNS, etc).
    #[error("upstream network error: {0}")]
    Network(String),

    /// The requested resource was not found (used by the in-memory test double).
    #[error("resource not found: {0}")]
    NotFound(String),
}

/// I/O-specific errors for file and archive operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read a file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write a file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// Dev-harness CLI command errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Unknown command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// Output format error.
    #[error("output format error: {0}")]
    OutputFormat(String),
}

// Implement From traits for standard library and third-party error types
// that don't have a natural home as a direct variant field.

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Database(err.to_string()))
    }
}

impl From<regex::Error> for ChunkingError {
    fn from(err: regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ChunkingError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: err.utf8_error().valid_up_to(),
        }
    }
}

impl From<std::str::Utf8Error> for ChunkingError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: err.valid_up_to(),
        }
    }
}
