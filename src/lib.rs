//! Suitecrawl: a suite-driven page scraper
//!
//! This crate drives a page-rendering environment across suites of URLs,
//! extracts items from each rendered page, follows discovered links up to a
//! bounded depth and streams the collected items through a batching writer.

pub mod config;
pub mod crawler;
pub mod logging;
pub mod output;
pub mod page;
pub mod registry;
pub mod state;

use thiserror::Error;

/// Main error type for suitecrawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Page error: {0}")]
    Page(#[from] page::PageError),

    #[error("No suites configured")]
    NoSuites,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No configuration sources given")]
    NoSources,
}

/// Result type alias for suitecrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, RunConfig, SuiteConfig};
pub use crawler::{run_crawl, LazyValue, Manager, RunSummary, Suite, SuiteOptions};
pub use output::{Formatter, Item, Writer};
pub use page::{Browser, Page};
pub use registry::Registry;
pub use state::{ScrapeState, VisitedSet};
