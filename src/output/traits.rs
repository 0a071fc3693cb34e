//! Output traits and types
//!
//! This module defines the trait interfaces for formatters, sinks and
//! writers, and the error type they share.

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format item: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Writer requires {0} to be configured")]
    MissingPath(&'static str),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A scraped item
pub type Item = serde_json::Value;

/// Serialization contract: per-item encoding plus framing tokens
///
/// A batch is rendered as `start` (first flush) or `delimiter` (later
/// flushes), the formatted items joined by `delimiter`, and `end` on the
/// final flush.
pub trait Formatter: Send {
    /// Token emitted once, before the first item
    ///
    /// Called after the first batch has been formatted, so a formatter may
    /// derive it from the items it has seen.
    fn start(&self) -> String;

    /// Token emitted between items and between batches
    fn delimiter(&self) -> &str;

    /// Token emitted once, after the last item
    fn end(&self) -> &str;

    /// Encodes a single item
    fn format(&mut self, item: &Item) -> OutputResult<String>;
}

/// Append-only output primitive
pub trait Sink: Send {
    /// Appends a chunk of text
    fn write(&mut self, chunk: &str) -> OutputResult<()>;
}

/// Collects scraped items and streams them to an output
pub trait Writer: Send {
    /// Adds one item, or every element when `item` is a JSON array
    fn add(&mut self, item: Item) -> OutputResult<()>;

    /// Flushes whatever is still buffered and closes the framing
    ///
    /// Only the first call has any effect.
    fn finish(&mut self) -> OutputResult<()>;

    /// Cumulative number of items ever added
    fn count(&self) -> usize;
}

/// Normalizes a scraper result into the list of items it contributes
///
/// Arrays are flattened one level and `null` contributes nothing.
pub fn flatten_item(item: Item) -> Vec<Item> {
    match item {
        Item::Array(items) => items,
        Item::Null => Vec::new(),
        other => vec![other],
    }
}
