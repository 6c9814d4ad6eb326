//! # retrieval-core
//!
//! Hierarchical semantic retrieval engine for documents and repositories.
//!
//! An artifact (a document attachment, or a repository archive on a
//! branch) is chunked, summarized into a hierarchical overview, and
//! embedded into one of four vector collections. Queries run through a
//! multi-stage retriever: embed, filter-scoped similarity search,
//! cross-encoder rerank, then a final hybrid-summarized answer.
//!
//! ## Modules
//!
//! - [`core`]: artifact/chunk/overview/query domain types, no I/O.
//! - [`chunking`]: fixed-window document and repository chunkers.
//! - [`overview`]: README-first and generated hierarchical overview builder.
//! - [`embedding`]: `Embedder` trait, `FastEmbed`/fallback implementations.
//! - [`rerank`]: `CrossEncoder` trait, `FastEmbed`/lexical-overlap fallback.
//! - [`summarize`]: `Summarizer` trait and its four strategies.
//! - [`store`]: SQLite-backed vector collections and the filter language.
//! - [`archive`]: zip extraction and indexable-file filtering.
//! - [`index`]: the Indexer orchestrating chunk/overview/write.
//! - [`io`]: local file I/O for the dev harness.
//! - [`retrieve`]: the Multi-Stage Retriever.
//! - [`clients`]: outbound Document/Repository Service client contracts.
//! - [`service`]: the Service Facade (`DocumentService`/`RepositoryService`).
//! - [`tool`]: the Tool Dispatcher.
//! - [`config`]: engine configuration loading.
//! - [`error`]: the crate's layered error hierarchy.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod archive;
pub mod chunking;
pub mod clients;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod index;
pub mod io;
pub mod overview;
pub mod rerank;
pub mod retrieve;
pub mod service;
pub mod store;
pub mod summarize;
pub mod tool;

pub use error::{Error, Result};

pub use core::{
    ArtifactClass, ArtifactRef, Chunk, ChunkMeta, ChunkQueryResponse, DocumentAttachment, DocumentMetadata,
    FilterNode, FilterOperator, Hit, Overview, OverviewQueryResponse, OverviewSource, QueryRequest, RepositoryBranch,
    RepositoryMetadata, DEFAULT_TOP_K,
};

pub use chunking::{Chunker, DocumentChunker, RepositoryChunker};

pub use embedding::{cosine_similarity, create_embedder, Embedder, FallbackEmbedder, DEFAULT_DIMENSIONS};
#[cfg(feature = "fastembed-embeddings")]
pub use embedding::FastEmbedEmbedder;

pub use rerank::{create_cross_encoder, CrossEncoder, LexicalOverlapReranker};
#[cfg(feature = "fastembed-embeddings")]
pub use rerank::FastEmbedReranker;

pub use summarize::{
    AbstractiveSummarizer, ExtractiveSummarizer, HierarchicalSummarizer, HybridSummarizer, Summarizer,
};

pub use store::{CollectionName, VectorStore, WriteRecord};

pub use overview::OverviewBuilder;

pub use clients::{
    DocumentServiceClient, IdentityTokenProvider, LocalArtifactSource, NoopPublisher, RepositoryServiceClient,
    ToolDescriptorPublisher,
};

pub use index::{DocumentIndexResult, DocumentIndexer, IndexedFileSummary, RepositoryIndexResult, RepositoryIndexer};

pub use retrieve::{MultiStageRetriever, RetrieverConfig};

pub use service::{DocumentService, RepositoryService};

pub use tool::{InvokeRequest, InvokeResponse, ToolDescriptor, ToolRegistry};

pub use config::{load as load_config, EngineConfig};
