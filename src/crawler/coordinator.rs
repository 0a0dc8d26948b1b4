//! Crawl coordinator - pagination driver
//!
//! This module contains the crawl loop that ties everything together:
//! - Consulting the visited ledger before processing a page
//! - Running the page processor and threading the quota forward
//! - Finding the next page through the numbered pager
//! - Recording the run and reporting totals

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::page::{PageOutcome, PageProcessor};
use crate::crawler::parser::find_pagination_link;
use crate::state::{CrawlState, Termination, VisitedLedger};
use crate::storage::{open_storage, DedupStore, ImageRecordStore, RunStatus, SqliteStorage};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Per-run counters accumulated across pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlTotals {
    /// Pages fetched and parsed successfully
    pub pages_processed: u32,

    /// Pages skipped because the ledger already held them
    pub pages_skipped: u32,

    /// Pages whose fetch failed
    pub pages_failed: u32,

    pub links_found: u64,
    pub images_stored: u64,
    pub duplicates: u64,
    pub images_failed: u64,

    /// Failed images whose file or record write failed
    pub persistence_failures: u64,
}

impl CrawlTotals {
    fn absorb(&mut self, page: &PageOutcome) {
        self.pages_processed += 1;
        self.links_found += page.links_found as u64;
        self.images_stored += page.stored as u64;
        self.duplicates += page.duplicates as u64;
        self.images_failed += page.failed as u64;
        self.persistence_failures += page.persistence_failures as u64;
    }
}

/// Summary returned once a crawl reaches `Done`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Database ID of the run row
    pub run_id: i64,

    /// Quota the crawl was started with
    pub requested: u32,

    /// Quota still unmet when the crawl ended
    pub remaining_quota: u32,

    pub totals: CrawlTotals,

    pub termination: Termination,

    /// Final status written to the run row
    pub run_status: RunStatus,
}

/// Main crawler structure
///
/// Owns every handle the crawl needs; nothing is shared through globals.
pub struct Crawler<S = SqliteStorage> {
    config: Arc<Config>,
    fetcher: Fetcher,
    store: DedupStore<S>,
    ledger: VisitedLedger,
    limiter: Arc<Semaphore>,
}

impl Crawler<SqliteStorage> {
    /// Creates a crawler from configuration
    ///
    /// Opens the database, creates the image directory and loads the ledger.
    /// Any failure here is a startup error.
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        let store = DedupStore::new(&config.output.image_directory, storage)?;
        let ledger = VisitedLedger::load(&config.output.ledger_path)?;
        let fetcher = Fetcher::from_config(&config.user_agent, &config.crawler)?;

        tracing::info!(
            "Images -> {}, database -> {}, ledger -> {} ({} pages already visited)",
            config.output.image_directory,
            config.output.database_path,
            ledger.path().display(),
            ledger.len()
        );

        Ok(Self::with_parts(config, fetcher, store, ledger))
    }
}

impl<S: ImageRecordStore> Crawler<S> {
    /// Assembles a crawler from already-built parts
    pub fn with_parts(
        config: Config,
        fetcher: Fetcher,
        store: DedupStore<S>,
        ledger: VisitedLedger,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.crawler.concurrency_limit as usize));

        Self {
            config: Arc::new(config),
            fetcher,
            store,
            ledger,
            limiter,
        }
    }

    pub fn ledger(&self) -> &VisitedLedger {
        &self.ledger
    }

    pub fn store(&self) -> &DedupStore<S> {
        &self.store
    }

    /// Runs a crawl from the configured start URL for `quota` images
    ///
    /// Per-page and per-image failures are logged and absorbed; the crawl
    /// always reaches `Done`. Only run bookkeeping errors are returned.
    pub async fn run(&mut self, quota: u32) -> Result<CrawlReport, HarvestError> {
        if quota == 0 {
            return Err(HarvestError::InvalidQuota(quota));
        }

        let run_id = self.store.with_records(|r| r.create_run(quota)).await?;
        tracing::info!("Starting harvest run {} for {} images", run_id, quota);

        let start_time = std::time::Instant::now();
        let mut totals = CrawlTotals::default();
        let mut remaining = quota;
        let mut state = CrawlState::start(self.config.crawler.start_url.clone(), quota);

        let termination = loop {
            tracing::debug!("Crawl state: {}", state);

            match &state {
                CrawlState::Processing { url, quota, .. } => {
                    let left = self.visit(url, *quota, &mut totals).await;
                    remaining = left;
                    state = state.finish_page(left);
                }

                CrawlState::Advancing { url, quota, .. } => {
                    if !state.wants_next_page() {
                        tracing::info!("The required number of images has been downloaded");
                        state = state.advance(None);
                        continue;
                    }

                    let next_number = state.next_page_number().unwrap_or(1);
                    match self.find_next_page(url, next_number).await {
                        Ok(next_url) => {
                            tracing::info!("Moving to page {}: {}", next_number, next_url);
                            state = state.advance(Some(next_url));
                        }
                        Err(e @ HarvestError::PageNotFound { .. }) => {
                            tracing::warn!("{} with {} images still requested", e, quota);
                            state = state.advance(None);
                        }
                        Err(e) => {
                            tracing::warn!("Could not re-fetch {} for pagination: {}", url, e);
                            let url = url.clone();
                            state = state.abort(Termination::PaginationFetchFailed { url });
                        }
                    }
                }

                CrawlState::Done(termination) => break termination.clone(),
            }
        };

        let run_status = self.finish_run(run_id, &totals).await?;

        tracing::info!(
            "Harvest run {} finished ({}) in {:?}: {} pages processed, {} skipped, {} failed; \
             {} images stored, {} duplicates, {} failed; {} still requested",
            run_id,
            termination,
            start_time.elapsed(),
            totals.pages_processed,
            totals.pages_skipped,
            totals.pages_failed,
            totals.images_stored,
            totals.duplicates,
            totals.images_failed,
            remaining
        );
        if !termination.is_satisfied() {
            tracing::warn!(
                "Harvest run {} stopped short: {} of {} images still requested",
                run_id,
                remaining,
                quota
            );
        }

        Ok(CrawlReport {
            run_id,
            requested: quota,
            remaining_quota: remaining,
            totals,
            termination,
            run_status,
        })
    }

    /// Closes the run row: failed if any image could not be persisted,
    /// completed otherwise
    async fn finish_run(
        &self,
        run_id: i64,
        totals: &CrawlTotals,
    ) -> Result<RunStatus, HarvestError> {
        if totals.persistence_failures > 0 {
            tracing::error!(
                "Harvest run {} marked failed: {} images could not be persisted",
                run_id,
                totals.persistence_failures
            );
            self.store.with_records(|r| r.fail_run(run_id)).await?;
            return Ok(RunStatus::Failed);
        }

        let pages = totals.pages_processed;
        let stored = u32::try_from(totals.images_stored).unwrap_or(u32::MAX);
        let completed = self
            .store
            .with_records(|r| r.complete_run(run_id, pages, stored))
            .await;

        if let Err(e) = completed {
            tracing::error!("Failed to complete harvest run {}: {}", run_id, e);
            if let Err(fail_err) = self.store.with_records(|r| r.fail_run(run_id)).await {
                tracing::warn!("Failed to mark run {} as failed: {}", run_id, fail_err);
            }
            return Err(e.into());
        }

        Ok(RunStatus::Completed)
    }

    /// Handles one page and returns the quota left afterwards
    ///
    /// Visited pages are skipped with the quota unchanged. A page is recorded
    /// in the ledger only after it was fetched and parsed; a failed page
    /// keeps the quota it was given.
    async fn visit(&mut self, url: &str, quota: u32, totals: &mut CrawlTotals) -> u32 {
        if self.ledger.contains(url) {
            tracing::info!("Page {} has been visited, skipping", url);
            totals.pages_skipped += 1;
            return quota;
        }

        let result = PageProcessor::new(
            &self.fetcher,
            &self.store,
            &self.limiter,
            &self.config.crawler,
        )
        .process_page(url, quota)
        .await;

        match result {
            Ok(outcome) => {
                tracing::info!(
                    "Processed {}: {} links, {} stored, {} duplicates, {} failed, {} remaining",
                    url,
                    outcome.links_found,
                    outcome.stored,
                    outcome.duplicates,
                    outcome.failed,
                    outcome.remaining
                );
                totals.absorb(&outcome);

                if let Err(e) = self.ledger.record(url) {
                    tracing::warn!("Failed to record {} as visited: {}", url, e);
                }

                outcome.remaining
            }
            Err(e) => {
                tracing::warn!("Error processing page {}: {}", url, e);
                totals.pages_failed += 1;
                quota
            }
        }
    }

    /// Re-fetches `url` and resolves the pager link labelled `page_number`
    ///
    /// Returns `PageNotFound` when the page has no such link.
    async fn find_next_page(&self, url: &str, page_number: u32) -> Result<String, HarvestError> {
        let html = self.fetcher.fetch_text(url).await?;
        let base = Url::parse(url)?;

        find_pagination_link(&html, &self.config.crawler.pager_class, page_number, &base)
            .map(String::from)
            .ok_or_else(|| HarvestError::PageNotFound {
                url: url.to_string(),
                page_number,
            })
    }
}

/// Runs a complete harvest for `count` images
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `count` - Number of images requested; must be at least 1
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl reached `Done`, even if some images failed
/// * `Err(HarvestError)` - Invalid quota, or startup/bookkeeping failed
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::config::load_config_from_env;
/// use sumi_harvest::crawler::harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config_from_env()?;
/// let report = harvest(config, 10).await?;
/// println!("{} pages processed", report.totals.pages_processed);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: Config, count: u32) -> Result<CrawlReport, HarvestError> {
    if count == 0 {
        return Err(HarvestError::InvalidQuota(count));
    }

    let mut crawler = Crawler::new(config)?;
    crawler.run(count).await
}
