//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per unique normalized image, keyed by content fingerprint
CREATE TABLE IF NOT EXISTS images (
    fingerprint TEXT PRIMARY KEY,
    locator TEXT NOT NULL,
    source_url TEXT NOT NULL,
    byte_size INTEGER NOT NULL,
    stored_at TEXT NOT NULL
);

-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    requested INTEGER NOT NULL,
    pages_processed INTEGER NOT NULL DEFAULT 0,
    images_stored INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
