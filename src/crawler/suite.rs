//! Scraper suites
//!
//! A suite is an ordered list of URLs sharing one set of options. It scrapes
//! its URLs one at a time and, when link discovery turns up URLs nobody has
//! opened yet, queues a child suite one level deeper.

use crate::config::SuiteConfig;
use crate::crawler::context::RunContext;
use crate::crawler::lazy::LazyValue;
use crate::crawler::protocol::scrape_url;
use crate::page::{forward_messages, Page};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options shared by a suite and every child it spawns
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    /// Polled until true (or the readiness limit runs out) before extraction
    pub ready: LazyValue<bool>,

    /// When false, the page is counted as visited but nothing is extracted
    pub scrapable: LazyValue<bool>,

    /// Resolved right before the scrapers; the result is discarded
    pub pre_scrape: Option<LazyValue<Value>>,

    /// Run in order; each result goes to the writer
    pub scrapers: Vec<LazyValue<Value>>,

    /// Injected after the scrapability check
    pub load_scripts: Vec<PathBuf>,

    /// Produces candidate URLs for a child suite
    ///
    /// A `Func` hook never sees the page; hooks that read links from the
    /// document must be `Expr`.
    pub more_urls: Option<LazyValue<Vec<String>>>,

    /// Deepest level a child suite may be created at
    pub max_depth: Option<u32>,

    /// Isolate injected helpers from page globals
    pub no_conflict: bool,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            ready: LazyValue::Value(true),
            scrapable: LazyValue::Value(true),
            pre_scrape: None,
            scrapers: Vec::new(),
            load_scripts: Vec::new(),
            more_urls: None,
            max_depth: None,
            no_conflict: false,
        }
    }
}

impl From<&SuiteConfig> for SuiteOptions {
    fn from(config: &SuiteConfig) -> Self {
        let defaults = Self::default();
        Self {
            ready: config.ready.clone().unwrap_or(defaults.ready),
            scrapable: config.scrapable.clone().unwrap_or(defaults.scrapable),
            pre_scrape: config.pre_scrape.clone(),
            scrapers: config.all_scrapers(),
            load_scripts: config.load_script.clone(),
            more_urls: config.more_urls.clone(),
            max_depth: config.max_depth,
            no_conflict: config.no_conflict,
        }
    }
}

/// A titled, depth-tagged list of URLs
#[derive(Debug, Clone)]
pub struct Suite {
    pub title: String,
    pub urls: Vec<String>,
    pub options: Arc<SuiteOptions>,
    pub depth: u32,
    cursor: usize,
}

impl Suite {
    /// Creates a top-level suite
    pub fn new(title: impl Into<String>, urls: Vec<String>, options: SuiteOptions) -> Self {
        Self {
            title: title.into(),
            urls,
            options: Arc::new(options),
            depth: 0,
            cursor: 0,
        }
    }

    /// Builds the suite declared by the `index`-th (zero-based) `[[suite]]`
    /// table
    pub fn from_config(config: &SuiteConfig, index: usize) -> Self {
        let title = config
            .title
            .clone()
            .unwrap_or_else(|| format!("suite-{}", index + 1));
        Self::new(title, config.all_urls(), SuiteOptions::from(config))
    }

    /// Creates the child spawned while scraping `self.urls[index]`
    pub fn child(&self, index: usize, urls: Vec<String>) -> Self {
        Self {
            title: format!("{}-sub{}", self.title, index),
            urls,
            options: Arc::clone(&self.options),
            depth: self.depth + 1,
            cursor: 0,
        }
    }

    /// Whether this suite may still spawn a child
    pub fn can_spawn_child(&self) -> bool {
        self.options.max_depth.map_or(true, |max| self.depth < max)
    }

    /// Number of URLs processed so far
    pub fn progress(&self) -> usize {
        self.cursor
    }

    /// Scrapes every remaining URL, queueing discovered children on the way
    pub async fn run(&mut self, ctx: &mut RunContext) -> crate::Result<()> {
        info!(
            "Running suite '{}' ({} urls, depth {})",
            self.title,
            self.urls.len(),
            self.depth
        );

        while let Some(url) = self.urls.get(self.cursor).cloned() {
            let index = self.cursor;
            let (outcome, page) = scrape_url(ctx, &self.options, &url).await?;

            if let Some(mut page) = page {
                if let Some(child) = self.discover_links(ctx, page.as_mut(), index).await {
                    info!(
                        "Queueing suite '{}' with {} urls",
                        child.title,
                        child.urls.len()
                    );
                    ctx.queue.enqueue(child);
                }
                forward_messages(page.as_mut());
                page.close().await;
            }

            debug!("{} done ({} items)", url, outcome.items);
            self.cursor += 1;
        }

        info!("Suite '{}' complete", self.title);
        Ok(())
    }

    /// Resolves the link-discovery hook and builds a child from the URLs
    /// nobody has opened yet
    ///
    /// Returns `None` when there is no hook, nothing new was found or the
    /// lineage is already at its maximum depth.
    pub async fn discover_links(
        &self,
        ctx: &RunContext,
        page: &mut dyn Page,
        index: usize,
    ) -> Option<Suite> {
        let hook = self.options.more_urls.as_ref()?;

        let candidates = match hook.resolve(page).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Link discovery failed in suite '{}': {}", self.title, e);
                return None;
            }
        };

        let fresh = ctx.visited.unvisited(candidates);
        if fresh.is_empty() {
            return None;
        }

        if !self.can_spawn_child() {
            debug!(
                "Suite '{}' is at max depth {}, dropping {} urls",
                self.title, self.depth, fresh.len()
            );
            return None;
        }

        Some(self.child(index, fresh))
    }
}
