//! Core domain models for the retrieval engine.
//!
//! Pure data types shared by the chunking, overview, store, retrieval, and
//! tool dispatch modules. None of these types perform I/O.

pub mod artifact;
pub mod chunk;
pub mod overview;
pub mod query;

pub use artifact::{
    ArtifactClass, ArtifactRef, DocumentAttachment, DocumentMetadata, RepositoryBranch,
    RepositoryMetadata,
};
pub use chunk::{Chunk, ChunkMeta};
pub use overview::{Overview, OverviewSource};
pub use query::{
    ChunkQueryResponse, FilterNode, FilterOperator, Hit, OverviewQueryResponse, QueryRequest,
    DEFAULT_TOP_K,
};
