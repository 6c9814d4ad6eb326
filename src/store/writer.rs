//! Upsert-by-id write pipeline and raw row loading.

use super::CollectionName;
use crate::Result;
use crate::error::StoreError;
use rusqlite::{Connection, params};

/// An un-embedded record destined for a collection: the writer embeds
/// `content` and persists `{id, vector, content, meta}`, keyed by `id`
/// (upsert semantics).
#[derive(Debug, Clone)]
pub struct WriteRecord {
    /// Stable record id (chunk id or overview id).
    pub id: String,
    /// Text content to embed and store.
    pub content: String,
    /// Arbitrary structured metadata, stored alongside the embedding.
    pub meta: serde_json::Value,
}

impl WriteRecord {
    /// Builds a write record.
    #[must_use]
    pub const fn new(id: String, content: String, meta: serde_json::Value) -> Self {
        Self { id, content, meta }
    }
}

/// A fully persisted record as read back from storage.
pub(super) struct StoredRecord {
    pub id: String,
    pub content: String,
    pub meta: serde_json::Value,
    pub vector: Vec<f32>,
}

pub(super) fn upsert(
    conn: &Connection,
    collection: CollectionName,
    records: &[WriteRecord],
    vectors: &[Vec<f32>],
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, content, meta, vector) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET content = excluded.content, meta = excluded.meta, vector = excluded.vector",
        collection.as_str()
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StoreError::WriteFailed { collection: collection.to_string(), reason: e.to_string() })?;

    for (record, vector) in records.iter().zip(vectors.iter()) {
        let meta_json = serde_json::to_string(&record.meta).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let vector_blob = encode_vector(vector);
        stmt.execute(params![record.id, record.content, meta_json, vector_blob])
            .map_err(|e| StoreError::WriteFailed { collection: collection.to_string(), reason: e.to_string() })?;
    }
    Ok(())
}

pub(super) fn load_all(conn: &Connection, collection: CollectionName) -> Result<Vec<StoredRecord>> {
    let sql = format!("SELECT id, content, meta, vector FROM {}", collection.as_str());
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StoreError::Database(format!("failed to read {collection}: {e}")))?;

    let rows = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let content: String = row.get(1)?;
            let meta_json: String = row.get(2)?;
            let vector_blob: Vec<u8> = row.get(3)?;
            Ok((id, content, meta_json, vector_blob))
        })
        .map_err(|e| StoreError::Database(format!("failed to read {collection}: {e}")))?;

    let mut records = Vec::new();
    for row in rows {
        let (id, content, meta_json, vector_blob) =
            row.map_err(|e| StoreError::Database(format!("failed to read row from {collection}: {e}")))?;
        let meta = serde_json::from_str(&meta_json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let vector = decode_vector(&vector_blob);
        records.push(StoredRecord { id, content, meta, vector });
    }
    Ok(records)
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let array: [u8; 4] = chunk.try_into().unwrap_or([0, 0, 0, 0]);
            f32::from_le_bytes(array)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_vector_roundtrip() {
        let vector = vec![1.0_f32, -2.5, 0.0, 3.333_333];
        let encoded = encode_vector(&vector);
        let decoded = decode_vector(&encoded);
        assert_eq!(decoded, vector);
    }

    #[test]
    fn test_decode_empty_vector() {
        assert!(decode_vector(&[]).is_empty());
    }
}
