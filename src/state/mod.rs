//! State module for tracking crawl progress
//!
//! This module provides the run-scoped state the scrape protocol relies on.
//!
//! # Components
//!
//! - `ScrapeState`: The per-URL protocol state (opening, waiting, extracting, done)
//! - `VisitedSet`: Every URL handed to the page-open operation during the run

mod scrape_state;
mod visited;

// Re-export main types
pub use scrape_state::ScrapeState;
pub use visited::VisitedSet;
