//! Run-scoped state threaded through every suite

use crate::config::RunConfig;
use crate::crawler::manager::SuiteQueue;
use crate::output::Writer;
use crate::page::Browser;
use crate::state::VisitedSet;
use std::sync::Arc;

/// Counters accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Suites run to completion
    pub suites_run: usize,

    /// URLs handed to `Page::open`
    pub urls_opened: usize,

    /// URLs skipped because an earlier suite already opened them
    pub urls_skipped: usize,

    /// Opens that failed
    pub load_failures: usize,

    /// Loaded pages whose scrapability predicate was false
    pub not_scrapable: usize,

    /// Pages extracted after the readiness limit ran out
    pub readiness_timeouts: usize,
}

/// Everything a suite needs while it runs
///
/// Built once by the `Manager` and passed down by `&mut`; only the active
/// suite ever touches it.
pub struct RunContext {
    pub config: Arc<RunConfig>,
    pub visited: VisitedSet,
    pub queue: SuiteQueue,
    pub writer: Box<dyn Writer>,
    pub browser: Box<dyn Browser>,
    pub stats: RunStats,
}

impl RunContext {
    pub fn new(
        config: Arc<RunConfig>,
        queue: SuiteQueue,
        writer: Box<dyn Writer>,
        browser: Box<dyn Browser>,
    ) -> Self {
        Self {
            config,
            visited: VisitedSet::new(),
            queue,
            writer,
            browser,
            stats: RunStats::default(),
        }
    }
}
