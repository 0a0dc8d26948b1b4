//! Single-page processing
//!
//! Fetches one listing page, extracts its image links and acquires up to the
//! requested number of them concurrently. Each image task downloads,
//! normalizes and stores one image while holding a permit from the shared
//! limiter.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::extract_image_links;
use crate::media::normalize;
use crate::storage::{DedupStore, ImageRecordStore, StoreOutcome};
use crate::HarvestError;
use futures::future::join_all;
use tokio::sync::Semaphore;

/// Result of processing one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOutcome {
    /// Direct image links found on the page
    pub links_found: usize,

    /// Links actually handed to image tasks (at most the requested count)
    pub scheduled: usize,

    /// Images that produced a new record
    pub stored: usize,

    /// Images whose content was already recorded
    pub duplicates: usize,

    /// Images that failed to download, decode or store
    pub failed: usize,

    /// Subset of `failed` where the file or record write itself failed
    pub persistence_failures: usize,

    /// Quota left for the following pages
    pub remaining: u32,
}

/// Quota left after a page offering `links_found` images
///
/// Accounting is by links found, not by images stored: failed downloads do
/// not give quota back.
pub fn remaining_quota(requested: u32, links_found: usize) -> u32 {
    let found = u32::try_from(links_found).unwrap_or(u32::MAX);
    requested.saturating_sub(found)
}

/// Processes listing pages against shared fetch, store and limiter handles
pub struct PageProcessor<'a, S> {
    fetcher: &'a Fetcher,
    store: &'a DedupStore<S>,
    limiter: &'a Semaphore,
    settings: &'a CrawlerConfig,
}

impl<'a, S: ImageRecordStore> PageProcessor<'a, S> {
    pub fn new(
        fetcher: &'a Fetcher,
        store: &'a DedupStore<S>,
        limiter: &'a Semaphore,
        settings: &'a CrawlerConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            limiter,
            settings,
        }
    }

    /// Processes one page, acquiring at most `requested` images
    ///
    /// # Returns
    ///
    /// * `Ok(PageOutcome)` - The page was fetched and parsed; per-image
    ///   failures are counted, not propagated
    /// * `Err(HarvestError)` - The page itself could not be fetched
    pub async fn process_page(
        &self,
        url: &str,
        requested: u32,
    ) -> Result<PageOutcome, HarvestError> {
        let html = self.fetcher.fetch_text(url).await?;
        let links = extract_image_links(&html, &self.settings.image_suffix);

        let taken = &links[..links.len().min(requested as usize)];
        tracing::debug!(
            "{}: {} image links found, {} scheduled",
            url,
            links.len(),
            taken.len()
        );

        let results = join_all(taken.iter().map(|link| self.acquire_image(link))).await;

        let mut outcome = PageOutcome {
            links_found: links.len(),
            scheduled: taken.len(),
            remaining: remaining_quota(requested, links.len()),
            ..PageOutcome::default()
        };

        for (link, result) in taken.iter().zip(results) {
            match result {
                Ok(StoreOutcome::Stored { fingerprint, .. }) => {
                    tracing::debug!("Stored {} as {}", link, fingerprint);
                    outcome.stored += 1;
                }
                Ok(StoreOutcome::Duplicate { fingerprint }) => {
                    tracing::debug!("Duplicate content at {} ({})", link, fingerprint);
                    outcome.duplicates += 1;
                }
                Err(HarvestError::Persistence(e)) => {
                    tracing::error!("Failed to persist image {}: {}", link, e);
                    outcome.failed += 1;
                    outcome.persistence_failures += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to acquire image {}: {}", link, e);
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Download, normalize and store one image under a limiter permit
    async fn acquire_image(&self, link: &str) -> Result<StoreOutcome, HarvestError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| HarvestError::Task(e.to_string()))?;

        let bytes = self.fetcher.fetch_bytes(link).await?;

        let max_pixels = self.settings.max_image_pixels;
        let quality = self.settings.jpeg_quality;
        let normalized = tokio::task::spawn_blocking(move || normalize(bytes, max_pixels, quality))
            .await
            .map_err(|e| HarvestError::Task(e.to_string()))??;

        if normalized.recompressed {
            tracing::debug!(
                "Recompressed {} to {}x{}",
                link,
                normalized.width,
                normalized.height
            );
        }

        Ok(self.store.store(&normalized.bytes, link).await?)
    }
}
