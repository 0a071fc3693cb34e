//! Crawler module: suites, the per-URL scrape protocol and the run manager
//!
//! This module contains the core crawling logic, including:
//! - Literal-or-expression option values
//! - The per-URL state machine (open, wait for readiness, extract)
//! - Suites and depth-bounded link discovery
//! - The suite queue and overall run coordination

mod context;
mod lazy;
mod manager;
mod protocol;
mod suite;

pub use context::{RunContext, RunStats};
pub use lazy::LazyValue;
pub use manager::{run_crawl, Manager, RunSummary, SuiteQueue};
pub use protocol::{scrape_url, wait_until_ready, ScrapeOutcome};
pub use suite::{Suite, SuiteOptions};
