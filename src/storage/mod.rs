//! Storage module for persisting harvest data
//!
//! This module handles:
//! - SQLite database initialization and schema management
//! - Write-once image records keyed by content fingerprint
//! - Run tracking
//! - The dedup store that pairs the image directory with the record store

mod dedup;
mod schema;
mod sqlite;
mod traits;

pub use dedup::{DedupStore, StoreOutcome};
pub use sqlite::SqliteStorage;
pub use traits::{ImageRecordStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (creating if needed) the record database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A stored image, one per unique fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub fingerprint: String,
    pub locator: String,
    pub source_url: String,
    pub byte_size: u64,
    pub stored_at: String,
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub requested: u32,
    pub pages_processed: u32,
    pub images_stored: u32,
    pub status: RunStatus,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
