/// Crawl driver state definitions
///
/// The driver is an explicit state machine over `(url, quota, page_number)`,
/// stepped in a loop so stack depth does not grow with the number of pages.
use std::fmt;

/// Why a crawl reached `Done`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The requested number of images has been scheduled
    QuotaSatisfied,

    /// Quota remains but no pager link for `page_number` exists
    NoMorePages { page_number: u32 },

    /// Quota remains but the current page could not be re-fetched to find the pager
    PaginationFetchFailed { url: String },
}

impl Termination {
    /// Returns true if the crawl stopped because the quota was met
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::QuotaSatisfied)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaSatisfied => write!(f, "quota satisfied"),
            Self::NoMorePages { page_number } => write!(f, "no link to page {}", page_number),
            Self::PaginationFetchFailed { url } => write!(f, "could not re-fetch {}", url),
        }
    }
}

/// Current state of the pagination driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlState {
    /// `url` is about to be processed (or skipped if already visited)
    Processing {
        url: String,
        quota: u32,
        page_number: u32,
    },

    /// `url` has been handled; the driver decides whether to move on
    Advancing {
        url: String,
        quota: u32,
        page_number: u32,
    },

    /// Terminal
    Done(Termination),
}

impl CrawlState {
    /// Initial state for a crawl starting at page 1
    pub fn start(url: impl Into<String>, quota: u32) -> Self {
        Self::Processing {
            url: url.into(),
            quota,
            page_number: 1,
        }
    }

    /// `Processing -> Advancing` carrying the quota left after the page
    ///
    /// Any other state is returned unchanged.
    pub fn finish_page(self, remaining: u32) -> Self {
        match self {
            Self::Processing {
                url, page_number, ..
            } => Self::Advancing {
                url,
                quota: remaining,
                page_number,
            },
            other => other,
        }
    }

    /// Returns true if advancing needs a pagination lookup (quota remains)
    pub fn wants_next_page(&self) -> bool {
        matches!(self, Self::Advancing { quota, .. } if *quota > 0)
    }

    /// Page number the pagination lookup should search for
    pub fn next_page_number(&self) -> Option<u32> {
        match self {
            Self::Advancing { page_number, .. } => Some(page_number.saturating_add(1)),
            _ => None,
        }
    }

    /// `Advancing -> Processing | Done` given the pagination lookup result
    ///
    /// A zero quota always ends the crawl, whatever `next_url` holds. With
    /// quota left, a found link moves to the next page and an absent link
    /// ends the crawl.
    pub fn advance(self, next_url: Option<String>) -> Self {
        match self {
            Self::Advancing { quota: 0, .. } => Self::Done(Termination::QuotaSatisfied),
            Self::Advancing {
                quota, page_number, ..
            } => {
                let next_number = page_number.saturating_add(1);
                match next_url {
                    Some(url) => Self::Processing {
                        url,
                        quota,
                        page_number: next_number,
                    },
                    None => Self::Done(Termination::NoMorePages {
                        page_number: next_number,
                    }),
                }
            }
            other => other,
        }
    }

    /// Ends the crawl from any state
    pub fn abort(self, termination: Termination) -> Self {
        Self::Done(termination)
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Processing { .. } => "processing",
            Self::Advancing { .. } => "advancing",
            Self::Done(_) => "done",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing {
                url,
                quota,
                page_number,
            }
            | Self::Advancing {
                url,
                quota,
                page_number,
            } => write!(
                f,
                "{} page {} ({}), quota {}",
                self.name(),
                page_number,
                url,
                quota
            ),
            Self::Done(reason) => write!(f, "done: {}", reason),
        }
    }
}
