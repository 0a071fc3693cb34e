//! Configuration module for suitecrawl
//!
//! This module handles loading, merging and validating TOML configuration
//! sources. Each source may set run keys at the top level and declare any
//! number of `[[suite]]` tables.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use suitecrawl::config::load_config;
//!
//! let config = load_config(&[PathBuf::from("site.toml")]).unwrap();
//! println!("Polling every {}ms", config.run.poll_interval);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ConfigFile, RunConfig, SuiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_file, load_config_with_hash};
pub use validation::validate_run_config;
