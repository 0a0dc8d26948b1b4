//! Sumi-Harvest: a paginated gallery image harvester
//!
//! This crate walks a paginated image gallery page by page, downloads the
//! direct image links it finds, normalizes and deduplicates them by content
//! fingerprint, and stops once a requested number of images has been
//! scheduled or the gallery runs out of pages.

pub mod config;
pub mod crawler;
pub mod media;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("No pagination link for page {page_number} on {url}")]
    PageNotFound { url: String, page_number: u32 },

    #[error("Image quota must be at least 1, got {0}")]
    InvalidQuota(u32),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnv { name: String, value: String },
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, CrawlReport, Termination};
pub use state::{CrawlState, VisitedLedger};
