//! Configuration module for Sumi-Harvest
//!
//! Configuration is built once at startup: TOML file (optional) on top of
//! defaults, then `SUMI_HARVEST_*` environment overrides, then validation.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Downloads capped at {} in flight", config.crawler.concurrency_limit);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

pub use parser::{apply_env_overrides, load_config, load_config_from_env, ENV_PREFIX};
pub use validation::validate;
