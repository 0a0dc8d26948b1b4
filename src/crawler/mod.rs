//! Crawler module for gallery traversal and image acquisition
//!
//! This module contains the crawl-and-acquire pipeline:
//! - HTTP fetching with timeouts and error classification
//! - Image link and pager link extraction
//! - Per-page bounded-concurrency image acquisition
//! - The pagination driver that threads the quota from page to page

mod coordinator;
mod fetcher;
mod page;
mod parser;

pub use coordinator::{harvest, CrawlReport, CrawlTotals, Crawler};
pub use fetcher::{build_http_client, Fetcher};
pub use page::{remaining_quota, PageOutcome, PageProcessor};
pub use parser::{extract_image_links, find_pagination_link};

pub use crate::state::Termination;
