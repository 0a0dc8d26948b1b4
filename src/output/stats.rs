//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{ImageRecordStore, RunRecord, StorageResult};

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Number of unique images stored
    pub images: u64,

    /// Total bytes across stored images
    pub total_bytes: u64,

    /// Number of recorded runs
    pub runs: u64,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl HarvestStatistics {
    /// Mean stored image size in bytes
    pub fn average_image_bytes(&self) -> u64 {
        if self.images == 0 {
            0
        } else {
            self.total_bytes / self.images
        }
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn ImageRecordStore) -> StorageResult<HarvestStatistics> {
    Ok(HarvestStatistics {
        images: storage.count_images()?,
        total_bytes: storage.total_image_bytes()?,
        runs: storage.count_runs()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Images:");
    println!("  Unique images stored: {}", stats.images);
    println!("  Total size: {} bytes", stats.total_bytes);
    println!("  Average size: {} bytes", stats.average_image_bytes());
    println!();

    println!("Runs: {}", stats.runs);
    if let Some(run) = &stats.latest_run {
        println!("  Latest run #{} ({})", run.id, run.status.to_db_string());
        println!("    Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("    Finished: {}", finished);
        }
        println!("    Requested: {}", run.requested);
        println!("    Pages processed: {}", run.pages_processed);
        println!("    Images stored: {}", run.images_stored);
    }
}
