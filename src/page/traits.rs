//! Page collaborator traits and error types
//!
//! The crawler never renders anything itself. It drives a `Page` through
//! open, evaluate and script injection, and asks a `Browser` for a fresh page
//! for every URL.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while driving a page
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Failed to load {url}: {message}")]
    Load { url: String, message: String },

    #[error("Evaluation of `{expr}` failed: {message}")]
    Evaluate { expr: String, message: String },

    #[error("Unexpected result from `{expr}`: {source}")]
    Decode {
        expr: String,
        source: serde_json::Error,
    },

    #[error("No document is loaded")]
    NotLoaded,

    #[error("Failed to create page: {0}")]
    Create(String),
}

/// Result type for page operations
pub type PageResult<T> = Result<T, PageError>;

/// A message raised by the page itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMessage {
    /// Console output
    Console(String),

    /// A modal alert
    Alert(String),
}

/// A single controllable page
#[async_trait]
pub trait Page: Send {
    /// Loads `url`, resolving once the open has completed
    async fn open(&mut self, url: &str) -> PageResult<()>;

    /// Evaluates an expression in the context of the loaded document
    async fn evaluate(&mut self, expr: &str) -> PageResult<Value>;

    /// Injects a script file into the loaded document
    ///
    /// # Returns
    ///
    /// * `true` - The script was injected
    /// * `false` - The script could not be injected
    async fn inject_script(&mut self, path: &Path) -> bool;

    /// Isolates injected helpers from the page's own globals
    async fn no_conflict(&mut self) -> PageResult<()> {
        Ok(())
    }

    /// Drains console and alert messages raised since the last call
    fn take_messages(&mut self) -> Vec<PageMessage> {
        Vec::new()
    }

    /// Releases the page; it is not used again afterwards
    async fn close(&mut self) {}
}

/// Factory for pages
#[async_trait]
pub trait Browser: Send {
    /// Creates a fresh page
    async fn new_page(&mut self) -> PageResult<Box<dyn Page>>;
}

/// Forwards page console and alert messages to the log
pub fn forward_messages(page: &mut dyn Page) {
    for message in page.take_messages() {
        match message {
            PageMessage::Console(text) => tracing::info!(target: "page", "{}", text),
            PageMessage::Alert(text) => tracing::info!(target: "page", "alert: {}", text),
        }
    }
}
