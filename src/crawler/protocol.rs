//! Per-URL scrape protocol
//!
//! A URL moves through `Opening → Waiting → Extracting → Done`:
//!
//! 1. **Opening**: claim the URL in the visited set and open a fresh page.
//!    A URL some earlier suite already claimed, or one that fails to load,
//!    goes straight to `Done` without a page.
//! 2. **Waiting**: poll the readiness predicate every `poll_interval` until it
//!    holds or `poll_timeout_limit` has elapsed. Running out of time is not an
//!    error; extraction goes ahead regardless.
//! 3. **Extracting**: check scrapability, inject suite scripts, run the
//!    pre-scrape hook, then every scraper in order, feeding the writer.
//! 4. **Done**: page messages are forwarded to the log and the page, if any,
//!    is handed back to the suite for link discovery.

use crate::config::RunConfig;
use crate::crawler::context::RunContext;
use crate::crawler::lazy::LazyValue;
use crate::crawler::suite::SuiteOptions;
use crate::page::{forward_messages, Page};
use crate::state::ScrapeState;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// What happened to a single URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeOutcome {
    /// The page opened successfully
    pub loaded: bool,

    /// The URL was already claimed and never opened
    pub skipped: bool,

    /// The readiness predicate never held before the limit
    pub timed_out: bool,

    /// Extraction ran (the page was scrapable)
    pub scraped: bool,

    /// Items handed to the writer
    pub items: usize,
}

/// Runs the full protocol for `url`
///
/// Returns the outcome together with the still-open page when the load
/// succeeded. The caller owns the page from then on and must close it.
pub async fn scrape_url(
    ctx: &mut RunContext,
    options: &SuiteOptions,
    url: &str,
) -> crate::Result<(ScrapeOutcome, Option<Box<dyn Page>>)> {
    let mut outcome = ScrapeOutcome::default();
    let mut page: Option<Box<dyn Page>> = None;
    let mut state = ScrapeState::Opening;

    while !state.is_terminal() {
        let next = match state {
            ScrapeState::Opening => match open_page(ctx, url).await? {
                Opened::Page(mut opened) => {
                    outcome.loaded = true;
                    prepare(&ctx.config, options, opened.as_mut(), url).await;
                    page = Some(opened);
                    ScrapeState::Waiting
                }
                Opened::Skipped => {
                    outcome.skipped = true;
                    ScrapeState::Done
                }
                Opened::Failed => ScrapeState::Done,
            },
            ScrapeState::Waiting => {
                if let Some(page) = page.as_deref_mut() {
                    let ready = wait_until_ready(
                        page,
                        &options.ready,
                        ctx.config.poll_interval(),
                        ctx.config.poll_timeout_limit(),
                    )
                    .await;
                    if !ready {
                        debug!(
                            "{} not ready after {}ms, extracting anyway",
                            url, ctx.config.poll_timeout_limit
                        );
                        outcome.timed_out = true;
                        ctx.stats.readiness_timeouts += 1;
                    }
                }
                ScrapeState::Extracting
            }
            ScrapeState::Extracting => {
                if let Some(page) = page.as_deref_mut() {
                    match extract(ctx, options, page, url).await? {
                        Some(items) => {
                            outcome.scraped = true;
                            outcome.items = items;
                        }
                        None => ctx.stats.not_scrapable += 1,
                    }
                }
                ScrapeState::Done
            }
            ScrapeState::Done => ScrapeState::Done,
        };

        debug_assert!(state.can_transition_to(next));
        trace!("{}: {} -> {}", url, state, next);
        state = next;
    }

    if let Some(page) = page.as_deref_mut() {
        forward_messages(page);
    }

    Ok((outcome, page))
}

enum Opened {
    Page(Box<dyn Page>),
    Skipped,
    Failed,
}

/// Claims `url` and opens it on a fresh page
async fn open_page(ctx: &mut RunContext, url: &str) -> crate::Result<Opened> {
    if !ctx.visited.insert(url) {
        debug!("Skipping {}: already visited", url);
        ctx.stats.urls_skipped += 1;
        return Ok(Opened::Skipped);
    }

    ctx.stats.urls_opened += 1;
    let mut page = ctx.browser.new_page().await?;

    debug!("Opening {}", url);
    match page.open(url).await {
        Ok(()) => Ok(Opened::Page(page)),
        Err(e) => {
            error!("Failed to load {}: {}", url, e);
            ctx.stats.load_failures += 1;
            forward_messages(page.as_mut());
            page.close().await;
            Ok(Opened::Failed)
        }
    }
}

/// Injects the run's base scripts and isolates them when asked to
async fn prepare(config: &RunConfig, options: &SuiteOptions, page: &mut dyn Page, url: &str) {
    for script in &config.base_scripts {
        if !page.inject_script(script).await {
            warn!("Failed to inject {} into {}", script.display(), url);
        }
    }

    if options.no_conflict {
        if let Err(e) = page.no_conflict().await {
            warn!("No-conflict isolation failed on {}: {}", url, e);
        }
    }
}

/// Polls `ready` until it holds or `limit` has elapsed
///
/// The predicate is checked once up front, then once after every `interval`.
/// Returns `false` when the limit ran out first. An evaluation error counts as
/// not ready.
pub async fn wait_until_ready(
    page: &mut dyn Page,
    ready: &LazyValue<bool>,
    interval: Duration,
    limit: Duration,
) -> bool {
    if is_ready(page, ready).await {
        return true;
    }

    let mut elapsed = Duration::ZERO;
    loop {
        tokio::time::sleep(interval).await;
        elapsed += interval;

        if is_ready(page, ready).await {
            return true;
        }
        if elapsed >= limit {
            return false;
        }
    }
}

async fn is_ready(page: &mut dyn Page, ready: &LazyValue<bool>) -> bool {
    match ready.resolve(page).await {
        Ok(ready) => ready,
        Err(e) => {
            trace!("Readiness check failed: {}", e);
            false
        }
    }
}

/// Runs the scrapers against a ready page
///
/// Returns `None` when the page is not scrapable, otherwise the number of
/// items the writer received.
async fn extract(
    ctx: &mut RunContext,
    options: &SuiteOptions,
    page: &mut dyn Page,
    url: &str,
) -> crate::Result<Option<usize>> {
    let scrapable = match options.scrapable.resolve(page).await {
        Ok(scrapable) => scrapable,
        Err(e) => {
            warn!("Scrapability check failed on {}: {}", url, e);
            false
        }
    };
    if !scrapable {
        debug!("{} is not scrapable", url);
        return Ok(None);
    }

    for script in &options.load_scripts {
        if !page.inject_script(script).await {
            warn!("Failed to inject {} into {}", script.display(), url);
        }
    }

    if let Some(hook) = &options.pre_scrape {
        if let Err(e) = hook.resolve(page).await {
            warn!("Pre-scrape hook failed on {}: {}", url, e);
        }
    }

    let before = ctx.writer.count();
    for (index, scraper) in options.scrapers.iter().enumerate() {
        match scraper.resolve(page).await {
            Ok(value) => ctx.writer.add(value)?,
            Err(e) => warn!("Scraper #{} failed on {}: {}", index + 1, url, e),
        }
    }
    let items = ctx.writer.count() - before;

    debug!("Scraped {} items from {}", items, url);
    Ok(Some(items))
}
