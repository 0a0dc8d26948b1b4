//! Content-addressed dedup store
//!
//! Pairs the image directory with an [`ImageRecordStore`]. Every store call
//! runs its check, file write and record insert under one async lock, so two
//! tasks racing on the same fingerprint cannot both create it.

use crate::media::fingerprint;
use crate::storage::traits::{ImageRecordStore, StorageResult};
use crate::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// File extension for stored images
pub const IMAGE_EXTENSION: &str = "jpg";

/// Outcome of a single store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// First time this content was seen; file and record were written
    Stored { fingerprint: String, path: PathBuf },

    /// Content already recorded; nothing new was created
    Duplicate { fingerprint: String },
}

impl StoreOutcome {
    /// Returns true if a new record was created
    pub fn inserted(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    pub fn fingerprint(&self) -> &str {
        match self {
            Self::Stored { fingerprint, .. } | Self::Duplicate { fingerprint } => fingerprint,
        }
    }
}

/// Dedup store over an image directory and a record backend
pub struct DedupStore<S = SqliteStorage> {
    directory: PathBuf,
    records: Mutex<S>,
}

impl<S: ImageRecordStore> DedupStore<S> {
    /// Creates a store writing files under `directory`
    ///
    /// The directory is created if it does not exist.
    pub fn new(directory: impl Into<PathBuf>, records: S) -> StorageResult<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;

        Ok(Self {
            directory,
            records: Mutex::new(records),
        })
    }

    /// Directory receiving image files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path an image with `fingerprint` is stored at
    pub fn path_for(&self, fingerprint: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", fingerprint, IMAGE_EXTENSION))
    }

    /// Stores normalized image bytes unless identical content already exists
    ///
    /// # Arguments
    ///
    /// * `bytes` - Final (normalized) image bytes; the fingerprint is taken over these
    /// * `source_url` - Where the bytes were downloaded from
    ///
    /// # Returns
    ///
    /// * `Ok(StoreOutcome::Stored)` - New content; file and record written
    /// * `Ok(StoreOutcome::Duplicate)` - Fingerprint already recorded
    /// * `Err(StorageError)` - File or database write failed
    pub async fn store(&self, bytes: &[u8], source_url: &str) -> StorageResult<StoreOutcome> {
        let fingerprint = fingerprint(bytes);
        let path = self.path_for(&fingerprint);

        let mut records = self.records.lock().await;

        if records.contains_image(&fingerprint)? {
            // Record survives but the file was removed by hand
            if !tokio::fs::try_exists(&path).await? {
                tracing::debug!("Restoring missing file for {}", fingerprint);
                write_atomically(&path, bytes).await?;
            }
            return Ok(StoreOutcome::Duplicate { fingerprint });
        }

        write_atomically(&path, bytes).await?;

        let locator = path.to_string_lossy();
        let inserted =
            records.insert_image(&fingerprint, &locator, source_url, bytes.len() as u64)?;

        if inserted {
            Ok(StoreOutcome::Stored { fingerprint, path })
        } else {
            Ok(StoreOutcome::Duplicate { fingerprint })
        }
    }

    /// Runs `f` with exclusive access to the record backend
    pub async fn with_records<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut records = self.records.lock().await;
        f(&mut records)
    }
}

/// Writes to a `.part` sibling and renames it into place
async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    tokio::fs::write(&partial, bytes).await?;
    tokio::fs::rename(&partial, path).await
}
