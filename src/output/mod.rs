//! Output module for reporting on harvest results

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
