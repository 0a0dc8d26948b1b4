use serde::Deserialize;

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// First gallery listing page
    pub start_url: String,

    /// Maximum number of image downloads in flight at once
    pub concurrency_limit: u32,

    /// Whole-request timeout for every fetch (seconds)
    pub request_timeout: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout: u64,

    /// Pixel-area budget; larger images are shrunk to fit
    pub max_image_pixels: u64,

    /// JPEG quality used when an image has to be re-encoded
    pub jpeg_quality: u8,

    /// Only `<img src>` values ending with this suffix are harvested
    pub image_suffix: String,

    /// CSS class marking pagination anchors
    pub pager_class: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: "https://wallpaperscraft.com/".to_string(),
            concurrency_limit: 8,
            request_timeout: 30,
            connect_timeout: 10,
            max_image_pixels: 1024 * 1024,
            jpeg_quality: 85,
            image_suffix: ".jpg".to_string(),
            pager_class: "pager__link".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// Optional URL with information about the crawler
    pub contact_url: Option<String>,

    /// Optional email address for crawler-related contact
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// `Name/Version`, followed by `(+ContactURL; ContactEmail)` when either
    /// contact detail is configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving `<fingerprint>.jpg` files
    pub image_directory: String,

    /// Path to the SQLite database holding image records
    pub database_path: String,

    /// Path to the append-only visited page ledger
    pub ledger_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_directory: "images".to_string(),
            database_path: "harvest.db".to_string(),
            ledger_path: "visited_urls.txt".to_string(),
        }
    }
}
