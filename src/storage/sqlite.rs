//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ImageRecordStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ImageRecordStore, StorageError, StorageResult};
use crate::storage::{ImageRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and ensures the schema exists
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        fingerprint: row.get(0)?,
        locator: row.get(1)?,
        source_url: row.get(2)?,
        byte_size: row.get::<_, i64>(3)?.max(0) as u64,
        stored_at: row.get(4)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        requested: row.get(3)?,
        pages_processed: row.get(4)?,
        images_stored: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(RunStatus::Failed),
    })
}

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, requested, pages_processed, images_stored, status";

impl ImageRecordStore for SqliteStorage {
    // ===== Image Records =====

    fn insert_image(
        &mut self,
        fingerprint: &str,
        locator: &str,
        source_url: &str,
        byte_size: u64,
    ) -> StorageResult<bool> {
        let size = i64::try_from(byte_size).map_err(|_| {
            StorageError::ConstraintViolation(format!("byte size {} out of range", byte_size))
        })?;
        let now = Utc::now().to_rfc3339();

        // The primary key makes this a single atomic check-and-insert
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO images (fingerprint, locator, source_url, byte_size, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![fingerprint, locator, source_url, size, now],
        )?;

        Ok(changed == 1)
    }

    fn get_image(&self, fingerprint: &str) -> StorageResult<Option<ImageRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT fingerprint, locator, source_url, byte_size, stored_at
                 FROM images WHERE fingerprint = ?1",
                params![fingerprint],
                image_from_row,
            )
            .optional()?;

        Ok(record)
    }

    fn contains_image(&self, fingerprint: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM images WHERE fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    fn count_images(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn total_image_bytes(&self) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(byte_size), 0) FROM images",
            [],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, requested: u32) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, requested, status) VALUES (?1, ?2, ?3)",
            params![now, requested, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        pages_processed: u32,
        images_stored: u32,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_processed = ?3, images_stored = ?4
             WHERE id = ?5",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                pages_processed,
                images_stored,
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Failed.to_db_string(), now, run_id],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
