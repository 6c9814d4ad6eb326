//! Vector Index Coordinator (spec.md §4.5).
//!
//! Four physical collections — `document_overview`, `document_chunk`,
//! `repository_overview`, `repository_chunk` — each backed by a table in
//! one SQLite database. Every collection exposes a writer pipeline
//! (embeds and upserts `{id, content, meta}` records) and a retriever
//! (filter tree → top-`k` hits by vector similarity).
//!
//! Retrievers are not stateful with respect to any filter: per Design Note
//! §9, a fresh [`crate::core::FilterNode`] is passed into each
//! [`VectorStore::retrieve`] call rather than mutated on a shared retriever
//! instance, so concurrent callers with different filters never interfere.
//! The writer pipeline serializes writes through an internal [`Mutex`]
//! around the database connection.

mod filter_eval;
mod schema;
mod writer;

#[cfg(feature = "usearch-hnsw")]
mod ann;

use crate::core::{ArtifactClass, FilterNode, Hit};
use crate::embedding::{Embedder, cosine_similarity};
use crate::error::StoreError;
use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use writer::WriteRecord;

/// One of the four physical collections the store coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    /// Document overview collection.
    DocumentOverview,
    /// Document chunk collection.
    DocumentChunk,
    /// Repository overview collection.
    RepositoryOverview,
    /// Repository chunk collection.
    RepositoryChunk,
}

impl CollectionName {
    /// All four collection names, in table-creation order.
    pub const ALL: [Self; 4] = [
        Self::DocumentOverview,
        Self::DocumentChunk,
        Self::RepositoryOverview,
        Self::RepositoryChunk,
    ];

    /// Returns the table/collection name used in storage and logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocumentOverview => "document_overview",
            Self::DocumentChunk => "document_chunk",
            Self::RepositoryOverview => "repository_overview",
            Self::RepositoryChunk => "repository_chunk",
        }
    }

    /// Returns the overview collection for `class`.
    #[must_use]
    pub const fn overview_for(class: ArtifactClass) -> Self {
        match class {
            ArtifactClass::Document => Self::DocumentOverview,
            ArtifactClass::Repository => Self::RepositoryOverview,
        }
    }

    /// Returns the chunk collection for `class`.
    #[must_use]
    pub const fn chunk_for(class: ArtifactClass) -> Self {
        match class {
            ArtifactClass::Document => Self::DocumentChunk,
            ArtifactClass::Repository => Self::RepositoryChunk,
        }
    }
}

impl std::fmt::Display for CollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The coordinator: a SQLite-backed store over the four collections, plus
/// the embedder used by both the writer and the retriever.
pub struct VectorStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
    #[cfg(feature = "usearch-hnsw")]
    ann: ann::AnnIndexSet,
}

impl VectorStore {
    /// Opens (creating if absent) a SQLite-backed store at `path`, with all
    /// four collection tables ensured to exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection or schema setup
    /// fails.
    pub fn open(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Database(format!("failed to open {}: {e}", path.display())))?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            #[cfg(feature = "usearch-hnsw")]
            ann: ann::AnnIndexSet::new(),
        })
    }

    /// Opens an in-memory store, primarily for tests and the dev harness.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if schema setup fails.
    pub fn open_in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Database(format!("failed to open in-memory database: {e}")))?;
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            #[cfg(feature = "usearch-hnsw")]
            ann: ann::AnnIndexSet::new(),
        })
    }

    /// Writes (embeds and upserts) a batch of records into `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] if embedding or persistence
    /// fails; per the two-phase indexer contract this is logged and
    /// re-raised by the caller rather than rolled back against a sibling
    /// write.
    pub fn write(&self, collection: CollectionName, records: &[WriteRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        let vectors = self.embedder.embed_batch(&contents).map_err(|e| {
            StoreError::WriteFailed {
                collection: collection.to_string(),
                reason: format!("embedding failed: {e}"),
            }
        })?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Database(format!("lock poisoned: {e}")))?;
        writer::upsert(&conn, collection, records, &vectors)?;
        drop(conn);

        #[cfg(feature = "usearch-hnsw")]
        self.ann.extend(collection, records, &vectors)?;

        Ok(())
    }

    /// Retrieves the top `top_k` hits from `collection` matching `filter`
    /// (if any), ranked by cosine similarity to the embedding of
    /// `query_text`.
    ///
    /// Builds a fresh filter evaluation per call; no retriever state is
    /// shared across concurrent callers.
    ///
    /// # Errors
    ///
    /// Returns an error if `filter` references an unsafe field name, the
    /// query fails to embed, or the underlying database read fails.
    pub fn retrieve(
        &self,
        collection: CollectionName,
        query_text: &str,
        filter: Option<&FilterNode>,
        top_k: usize,
    ) -> Result<Vec<Hit>> {
        if let Some(f) = filter {
            if !f.has_safe_field_names() {
                return Err(Error::Store(StoreError::InvalidFilterField {
                    field: "<rejected>".to_string(),
                }));
            }
        }

        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query_text)?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Database(format!("lock poisoned: {e}")))?;
        let rows = writer::load_all(&conn, collection)?;
        drop(conn);

        #[cfg(feature = "usearch-hnsw")]
        let candidate_ids: Option<std::collections::HashSet<String>> = {
            match self.ann.search(collection, &query_vector, top_k) {
                Ok(candidates) if !candidates.is_empty() => {
                    Some(candidates.into_iter().map(|(id, _)| id).collect())
                }
                _ => None,
            }
        };
        #[cfg(not(feature = "usearch-hnsw"))]
        let candidate_ids: Option<std::collections::HashSet<String>> = None;

        let mut scored: Vec<Hit> = rows
            .into_iter()
            .filter(|row| candidate_ids.as_ref().is_none_or(|ids| ids.contains(&row.id)))
            .filter(|row| filter.is_none_or(|f| filter_eval::matches(f, &row.meta)))
            .map(|row| {
                let score = cosine_similarity(&query_vector, &row.vector);
                Hit {
                    id: row.id,
                    content: row.content,
                    meta: row.meta,
                    score: Some(score),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .unwrap_or(f32::MIN)
                .partial_cmp(&a.score.unwrap_or(f32::MIN))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
