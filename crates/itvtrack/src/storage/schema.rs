//! `SQLite` schema for the local key-value database.
//!
//! The local flavour only needs one table; each key holds one serialized
//! blob. The schema version lives in `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Error, Result};

/// Schema version written by this build.
pub const SCHEMA_VERSION: i32 = 1;

/// SQL statement to create the key-value table.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// Create the `kv` table if needed and stamp the schema version.
///
/// # Errors
///
/// Returns [`Error::SchemaVersion`] if the database was written by a newer
/// schema, or a query error if table creation fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let found = schema_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(Error::SchemaVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    conn.execute(CREATE_KV_TABLE, [])?;
    if found < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        debug!("Schema version {} -> {}", found, SCHEMA_VERSION);
    }
    Ok(())
}

/// Version recorded in the database; 0 for a fresh file.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
