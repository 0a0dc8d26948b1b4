//! Storage traits and error types
//!
//! This module defines the trait interface for the image record backend and
//! associated error types.

use crate::storage::{ImageRecord, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for image record backends
///
/// Records are keyed by content fingerprint and written once. Implementations
/// are driven from behind the dedup store's write lock, so they only need
/// `&mut self` exclusivity, not internal synchronization.
pub trait ImageRecordStore {
    // ===== Image Records =====

    /// Inserts an image record unless one with the same fingerprint exists
    ///
    /// # Returns
    ///
    /// `true` if a new record was written, `false` if the fingerprint was
    /// already present (the existing record is left untouched)
    fn insert_image(
        &mut self,
        fingerprint: &str,
        locator: &str,
        source_url: &str,
        byte_size: u64,
    ) -> StorageResult<bool>;

    /// Gets a record by fingerprint
    fn get_image(&self, fingerprint: &str) -> StorageResult<Option<ImageRecord>>;

    /// Checks whether a fingerprint is already recorded
    fn contains_image(&self, fingerprint: &str) -> StorageResult<bool>;

    /// Counts stored image records
    fn count_images(&self) -> StorageResult<u64>;

    /// Sums the byte size of all stored images
    fn total_image_bytes(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new run for a requested image quota
    fn create_run(&mut self, requested: u32) -> StorageResult<i64>;

    /// Marks a run completed and records its totals
    fn complete_run(
        &mut self,
        run_id: i64,
        pages_processed: u32,
        images_stored: u32,
    ) -> StorageResult<()>;

    /// Marks a run failed
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Counts all recorded runs
    fn count_runs(&self) -> StorageResult<u64>;
}
