use crate::config::types::{Config, ConfigFile};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Parses a single configuration source
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(ConfigFile)` - The raw, unmerged source
/// * `Err(ConfigError)` - The file could not be read or parsed
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    parse_config_str(&content, path)
}

fn parse_config_str(content: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Loads, merges and validates configuration sources in order
///
/// Run keys set by a later source override earlier ones; suites are
/// appended in source order.
///
/// # Example
///
/// ```no_run
/// use std::path::PathBuf;
/// use suitecrawl::config::load_config;
///
/// let config = load_config(&[PathBuf::from("site.toml")]).unwrap();
/// println!("{} suites", config.suites.len());
/// ```
pub fn load_config(paths: &[PathBuf]) -> Result<Config, ConfigError> {
    if paths.is_empty() {
        return Err(ConfigError::NoSources);
    }

    let mut config = Config::default();
    for path in paths {
        let file = load_config_file(path)?;
        file.apply_to(&mut config.run);
        config.suites.extend(file.suites);
    }

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash over every configuration source, in order
///
/// Returns the hex-encoded digest.
pub fn compute_config_hash(paths: &[PathBuf]) -> Result<String, ConfigError> {
    let mut hasher = Sha256::new();
    for path in paths {
        let content = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        hasher.update(&content);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(paths: &[PathBuf]) -> Result<(Config, String), ConfigError> {
    let config = load_config(paths)?;
    let hash = compute_config_hash(paths)?;
    Ok((config, hash))
}
