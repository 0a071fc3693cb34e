use crate::config::types::{Config, RunConfig, SuiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_run_config(&config.run)?;

    if config.suites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[suite]] must be configured".to_string(),
        ));
    }

    for (index, suite) in config.suites.iter().enumerate() {
        validate_suite(index, suite)?;
    }

    Ok(())
}

/// Validates run-wide parameters
pub fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.poll_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "pollInterval must be >= 1ms, got {}ms",
            config.poll_interval
        )));
    }

    if config.batch_size == Some(0) {
        return Err(ConfigError::Validation(
            "batchSize must be >= 1 when set".to_string(),
        ));
    }

    if let Some(fields) = &config.csv_fields {
        if fields.is_empty() {
            return Err(ConfigError::Validation(
                "csvFields cannot be an empty list".to_string(),
            ));
        }
    }

    if matches!(config.writer.as_str(), "file" | "itemfile") && config.out_file.is_none() {
        return Err(ConfigError::Validation(format!(
            "writer '{}' requires outFile",
            config.writer
        )));
    }

    if config.logger == "file" && config.log_file.is_none() {
        return Err(ConfigError::Validation(
            "logger 'file' requires logFile".to_string(),
        ));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "requestTimeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates a single suite table
fn validate_suite(index: usize, suite: &SuiteConfig) -> Result<(), ConfigError> {
    let label = suite
        .title
        .clone()
        .unwrap_or_else(|| format!("suite #{}", index + 1));

    let urls = suite.all_urls();
    if urls.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} must have at least one url",
            label
        )));
    }

    for url in &urls {
        Url::parse(url).map_err(|e| {
            ConfigError::Validation(format!("{}: invalid url '{}': {}", label, url, e))
        })?;
    }

    if let Some(title) = &suite.title {
        if title.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "suite #{} has an empty title",
                index + 1
            )));
        }
    }

    Ok(())
}
