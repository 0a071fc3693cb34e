//! Log subscribers installed by the built-in loggers
//!
//! Every logger is a `tracing_subscriber::fmt` subscriber; they only differ in
//! where the formatted events go.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Errors raised while installing a logger
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Logger requires {0} to be configured")]
    MissingPath(&'static str),

    #[error("Cannot open log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global subscriber is already installed: {0}")]
    AlreadySet(#[from] TryInitError),
}

/// Builds the event filter for the given CLI verbosity
///
/// `RUST_LOG` wins when it is set.
pub fn env_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    if quiet {
        return EnvFilter::new("error");
    }

    match verbose {
        0 => EnvFilter::new("suitecrawl=info,page=info,warn"),
        1 => EnvFilter::new("suitecrawl=debug,page=debug,info"),
        2 => EnvFilter::new("suitecrawl=trace,page=trace,debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Sends formatted events to the console
///
/// Events go to stderr; stdout carries the item stream of the `stdout` writer.
pub fn init_console(filter: EnvFilter) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .finish()
        .try_init()?;
    Ok(())
}

/// Sends formatted events to `path`, truncating it first
pub fn init_file(path: &Path, filter: EnvFilter) -> Result<(), LoggingError> {
    let io_error = |source| LoggingError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(path).map_err(io_error)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .finish()
        .try_init()?;
    Ok(())
}
