//! Optional HNSW-backed approximate nearest neighbor index, one per
//! collection, gated behind the `usearch-hnsw` feature.
//!
//! Grounded on the teacher's `search::hnsw::HnswIndex` (usearch wrapper with
//! a `u64` key <-> application-id map); generalized here from the teacher's
//! `i64` chunk ids to this crate's string record ids, and from one index to
//! one per [`super::CollectionName`]. [`VectorStore::retrieve`] queries the
//! index first to narrow candidates to `top_k` times an oversampling factor
//! (filters are applied afterward against the rows loaded from SQLite, so
//! oversampling keeps recall reasonable once a filter discards some
//! candidates) and falls back to the brute-force scan this module's sibling
//! `mod.rs` already performs if the index is empty or the query errors.

use super::{CollectionName, WriteRecord};
use crate::error::StoreError;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

/// How many more candidates than `top_k` are pulled from the ANN index
/// before the caller's filter is applied, so a selective filter doesn't
/// starve the final result set.
const OVERSAMPLE_FACTOR: usize = 4;

struct PerCollectionIndex {
    inner: Option<Index>,
    id_map: HashMap<u64, String>,
    reverse_map: HashMap<String, u64>,
    next_key: u64,
}

impl PerCollectionIndex {
    const fn empty() -> Self {
        Self {
            inner: None,
            id_map: HashMap::new(),
            reverse_map: HashMap::new(),
            next_key: 0,
        }
    }

    fn ensure_index(&mut self, dimensions: usize) -> Result<()> {
        if self.inner.is_none() {
            let options = IndexOptions {
                dimensions,
                metric: MetricKind::Cos,
                quantization: ScalarKind::F32,
                connectivity: 16,
                expansion_add: 128,
                expansion_search: 64,
                multi: false,
            };
            let index = Index::new(&options)
                .map_err(|e| StoreError::VectorSearch(format!("failed to create HNSW index: {e}")))?;
            self.inner = Some(index);
        }
        Ok(())
    }

    fn extend(&mut self, records: &[WriteRecord], vectors: &[Vec<f32>]) -> Result<()> {
        for (record, vector) in records.iter().zip(vectors.iter()) {
            let dimensions = vector.len();
            if let Some(stale_key) = self.reverse_map.remove(&record.id) {
                self.id_map.remove(&stale_key);
                if let Some(index) = &self.inner {
                    let _ = index.remove(stale_key);
                }
            }
            let key = self.next_key;
            self.next_key += 1;
            self.ensure_index(dimensions)?;
            let index = self
                .inner
                .as_ref()
                .ok_or_else(|| StoreError::VectorSearch("HNSW index missing after init".to_string()))?;
            index
                .add(key, vector)
                .map_err(|e| StoreError::VectorSearch(format!("failed to add vector: {e}")))?;
            self.id_map.insert(key, record.id.clone());
            self.reverse_map.insert(record.id.clone(), key);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        let Some(index) = &self.inner else {
            return Ok(Vec::new());
        };
        if index.size() == 0 {
            return Ok(Vec::new());
        }
        let matches = index
            .search(query, k)
            .map_err(|e| StoreError::VectorSearch(format!("HNSW search failed: {e}")))?;
        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(key, distance)| {
                self.id_map.get(key).map(|id| (id.clone(), 1.0 - distance))
            })
            .collect())
    }
}

/// One HNSW index per physical collection, each built lazily on first
/// write (the embedding dimension is only known once the first batch is
/// embedded).
pub(super) struct AnnIndexSet {
    indices: [Mutex<PerCollectionIndex>; 4],
}

impl AnnIndexSet {
    pub(super) fn new() -> Self {
        Self {
            indices: [
                Mutex::new(PerCollectionIndex::empty()),
                Mutex::new(PerCollectionIndex::empty()),
                Mutex::new(PerCollectionIndex::empty()),
                Mutex::new(PerCollectionIndex::empty()),
            ],
        }
    }

    fn slot(&self, collection: CollectionName) -> &Mutex<PerCollectionIndex> {
        &self.indices[collection.slot_index()]
    }

    pub(super) fn extend(&self, collection: CollectionName, records: &[WriteRecord], vectors: &[Vec<f32>]) -> Result<()> {
        let mut guard = self
            .slot(collection)
            .lock()
            .map_err(|e| Error::Store(StoreError::Database(format!("ann lock poisoned: {e}"))))?;
        guard.extend(records, vectors)
    }

    /// Returns up to `top_k * OVERSAMPLE_FACTOR` candidate ids with their
    /// similarity scores, or an empty vec if the index hasn't been built yet
    /// (caller falls back to a brute-force scan in that case).
    pub(super) fn search(&self, collection: CollectionName, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        let guard = self
            .slot(collection)
            .lock()
            .map_err(|e| Error::Store(StoreError::Database(format!("ann lock poisoned: {e}"))))?;
        guard.search(query, top_k.saturating_mul(OVERSAMPLE_FACTOR).max(top_k))
    }
}

impl CollectionName {
    pub(super) const fn slot_index(self) -> usize {
        match self {
            Self::DocumentOverview => 0,
            Self::DocumentChunk => 1,
            Self::RepositoryOverview => 2,
            Self::RepositoryChunk => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WriteRecord;

    fn record(id: &str) -> WriteRecord {
        WriteRecord::new(id.to_string(), String::new(), serde_json::json!({}))
    }

    #[test]
    fn test_search_on_empty_index_returns_empty() {
        let set = AnnIndexSet::new();
        let hits = set.search(CollectionName::DocumentChunk, &[0.1, 0.2, 0.3], 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_extend_then_search_finds_nearest() {
        let set = AnnIndexSet::new();
        let records = [record("a"), record("b"), record("c")];
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
        set.extend(CollectionName::DocumentChunk, &records, &vectors).unwrap();
        let hits = set.search(CollectionName::DocumentChunk, &[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(hits.first().map(|(id, _)| id.as_str()), Some("a"));
    }

    #[test]
    fn test_reindexing_same_id_replaces_stale_key() {
        let set = AnnIndexSet::new();
        set.extend(CollectionName::DocumentChunk, &[record("a")], &[vec![1.0, 0.0, 0.0]])
            .unwrap();
        set.extend(CollectionName::DocumentChunk, &[record("a")], &[vec![0.0, 1.0, 0.0]])
            .unwrap();
        let hits = set.search(CollectionName::DocumentChunk, &[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(hits.first().map(|(id, _)| id.as_str()), Some("a"));
    }

    #[test]
    fn test_collections_are_isolated() {
        let set = AnnIndexSet::new();
        set.extend(CollectionName::DocumentChunk, &[record("a")], &[vec![1.0, 0.0, 0.0]])
            .unwrap();
        let hits = set
            .search(CollectionName::DocumentOverview, &[1.0, 0.0, 0.0], 5)
            .unwrap();
        assert!(hits.is_empty());
    }
}
