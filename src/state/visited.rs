use std::collections::HashSet;

/// Run-scoped set of URLs that have been handed to the page-open operation
///
/// The set only grows: a URL, once added, is never removed, so no URL can be
/// opened twice in a run.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL
    ///
    /// # Returns
    ///
    /// * `true` - The URL was not seen before and is now recorded
    /// * `false` - The URL was already visited
    pub fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    /// Returns whether the URL has been visited
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Returns the number of visited URLs
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns whether no URL has been visited yet
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Keeps only the URLs that have not been visited, dropping duplicates
    /// within `candidates` while preserving their order
    pub fn unvisited(&self, candidates: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|url| !self.contains(url) && seen.insert(url.clone()))
            .collect()
    }
}
