//! SQLite schema for the four vector collections.

use super::CollectionName;
use crate::Result;
use crate::error::StoreError;
use rusqlite::Connection;

/// Creates every collection's table if it doesn't already exist.
pub(super) fn ensure_schema(conn: &Connection) -> Result<()> {
    for name in CollectionName::ALL {
        create_table(conn, name)?;
    }
    Ok(())
}

fn create_table(conn: &Connection, name: CollectionName) -> Result<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            meta TEXT NOT NULL,
            vector BLOB NOT NULL
        )",
        name.as_str()
    );
    conn.execute(&sql, [])
        .map_err(|e| StoreError::Database(format!("failed to create table {name}: {e}")))?;
    Ok(())
}
