use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;
use std::str::FromStr;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SUMI_HARVEST_";

/// Loads a configuration file, applies environment overrides and validates it
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Start page: {}", config.crawler.start_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;

    Ok(config)
}

/// Builds a configuration from defaults and the process environment only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;

    Ok(config)
}

/// Overrides configuration fields from `SUMI_HARVEST_*` variables
///
/// The lookup is injected so callers (and tests) decide where values come from.
///
/// | Variable | Field |
/// |----------|-------|
/// | `SUMI_HARVEST_START_URL` | `crawler.start_url` |
/// | `SUMI_HARVEST_CONCURRENCY` | `crawler.concurrency_limit` |
/// | `SUMI_HARVEST_REQUEST_TIMEOUT` | `crawler.request_timeout` |
/// | `SUMI_HARVEST_MAX_IMAGE_PIXELS` | `crawler.max_image_pixels` |
/// | `SUMI_HARVEST_OUTPUT_DIR` | `output.image_directory` |
/// | `SUMI_HARVEST_DATABASE_PATH` | `output.database_path` |
/// | `SUMI_HARVEST_LEDGER_PATH` | `output.ledger_path` |
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        let name = format!("{}{}", ENV_PREFIX, suffix);
        lookup(&name).map(|value| (name, value))
    };

    if let Some((_, value)) = var("START_URL") {
        config.crawler.start_url = value;
    }
    if let Some((name, value)) = var("CONCURRENCY") {
        config.crawler.concurrency_limit = parse_env(&name, &value)?;
    }
    if let Some((name, value)) = var("REQUEST_TIMEOUT") {
        config.crawler.request_timeout = parse_env(&name, &value)?;
    }
    if let Some((name, value)) = var("MAX_IMAGE_PIXELS") {
        config.crawler.max_image_pixels = parse_env(&name, &value)?;
    }
    if let Some((_, value)) = var("OUTPUT_DIR") {
        config.output.image_directory = value;
    }
    if let Some((_, value)) = var("DATABASE_PATH") {
        config.output.database_path = value;
    }
    if let Some((_, value)) = var("LEDGER_PATH") {
        config.output.ledger_path = value;
    }

    Ok(())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}
