//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `VisitedLedger`: durable set of page URLs already processed
//! - `CrawlState`: the pagination driver's state machine
//! - `Termination`: why a crawl reached its terminal state

mod crawl_state;
mod ledger;

pub use crawl_state::{CrawlState, Termination};
pub use ledger::VisitedLedger;
