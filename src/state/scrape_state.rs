/// Scrape protocol state definitions
///
/// Every URL moves through these states exactly once, in order, possibly
/// jumping straight to `Done` when the page fails to load.
use std::fmt;

/// Represents the current state of a single URL in the scrape protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeState {
    /// The page open has been requested
    Opening,

    /// The page is loaded and the readiness predicate is being polled
    Waiting,

    /// Scrapers are running against the page
    Extracting,

    /// The URL is finished; link discovery may follow
    Done,
}

impl ScrapeState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// `Opening` may jump straight to `Done` on a load failure; every other
    /// state only advances one step.
    pub fn can_transition_to(&self, next: ScrapeState) -> bool {
        matches!(
            (self, next),
            (Self::Opening, Self::Waiting)
                | (Self::Opening, Self::Done)
                | (Self::Waiting, Self::Extracting)
                | (Self::Extracting, Self::Done)
        )
    }

    /// Returns a short lowercase name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Waiting => "waiting",
            Self::Extracting => "extracting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
