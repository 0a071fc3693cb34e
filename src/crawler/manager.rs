//! Suite queue and run manager
//!
//! The manager owns the run context and drains the suite queue one suite at a
//! time. Suites discovered during the run are appended to the tail, so every
//! suite already queued finishes before a newly discovered one starts. Once
//! the queue is empty the writer is finished and a summary is returned.

use crate::config::{validate_run_config, Config, RunConfig};
use crate::crawler::context::{RunContext, RunStats};
use crate::crawler::suite::Suite;
use crate::page::{Browser, HttpBrowser};
use crate::registry::Registry;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// FIFO queue of suites waiting to run
#[derive(Debug, Default)]
pub struct SuiteQueue {
    suites: VecDeque<Suite>,
}

impl SuiteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a suite to the tail
    pub fn enqueue(&mut self, suite: Suite) {
        self.suites.push_back(suite);
    }

    /// Pops the next suite to run
    pub fn advance(&mut self) -> Option<Suite> {
        self.suites.pop_front()
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

/// Totals reported once a run has drained its queue
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub items_written: usize,
    pub stats: RunStats,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items from {} urls across {} suites in {:.2}s ({} failed to load, {} skipped, {} not scrapable, {} readiness timeouts)",
            self.items_written,
            self.stats.urls_opened,
            self.stats.suites_run,
            self.elapsed.as_secs_f64(),
            self.stats.load_failures,
            self.stats.urls_skipped,
            self.stats.not_scrapable,
            self.stats.readiness_timeouts
        )
    }
}

/// Runs suites sequentially until the queue is empty
pub struct Manager {
    ctx: RunContext,
}

impl Manager {
    /// Creates a manager for every suite in `config`
    ///
    /// Fails before any output is created when there are no suites, when the
    /// run configuration is invalid or when a configured logger, formatter or
    /// writer name is not registered.
    pub fn new(
        config: Config,
        registry: &Registry,
        browser: Box<dyn Browser>,
    ) -> crate::Result<Self> {
        let suites = config
            .suites
            .iter()
            .enumerate()
            .map(|(index, suite)| Suite::from_config(suite, index))
            .collect();

        Self::from_suites(config.run, suites, registry, browser)
    }

    /// Creates a manager for suites built in code
    pub fn from_suites(
        run: RunConfig,
        suites: Vec<Suite>,
        registry: &Registry,
        browser: Box<dyn Browser>,
    ) -> crate::Result<Self> {
        if suites.is_empty() {
            return Err(CrawlError::NoSuites);
        }

        validate_run_config(&run)?;
        registry.validate(&run)?;

        let writer = registry.create_writer(&run)?;

        let mut queue = SuiteQueue::new();
        for suite in suites {
            queue.enqueue(suite);
        }

        Ok(Self {
            ctx: RunContext::new(Arc::new(run), queue, writer, browser),
        })
    }

    /// Number of suites waiting to run
    pub fn queued(&self) -> usize {
        self.ctx.queue.len()
    }

    /// Drains the queue, then finishes the writer
    pub async fn run(mut self) -> crate::Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Starting run with {} suites", self.ctx.queue.len());

        while let Some(mut suite) = self.ctx.queue.advance() {
            suite.run(&mut self.ctx).await?;
            self.ctx.stats.suites_run += 1;

            if !self.ctx.queue.is_empty() {
                info!(
                    "Progress: {} suites done, {} queued, {} items so far",
                    self.ctx.stats.suites_run,
                    self.ctx.queue.len(),
                    self.ctx.writer.count()
                );
            }
        }

        self.ctx.writer.finish()?;

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
            items_written: self.ctx.writer.count(),
            stats: self.ctx.stats,
        };
        info!("Run complete: {}", summary);

        Ok(summary)
    }
}

/// Runs every configured suite against the static HTML page
///
/// # Example
///
/// ```no_run
/// use std::path::PathBuf;
/// use suitecrawl::config::load_config;
/// use suitecrawl::{run_crawl, Registry};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(&[PathBuf::from("site.toml")])?;
/// let summary = run_crawl(config, &Registry::default()).await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, registry: &Registry) -> crate::Result<RunSummary> {
    let browser = HttpBrowser::new(&config.run)?;
    Manager::new(config, registry, Box::new(browser))?
        .run()
        .await
}
