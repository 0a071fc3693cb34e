use crate::crawler::LazyValue;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Fully merged configuration: run parameters plus every suite
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub run: RunConfig,
    pub suites: Vec<SuiteConfig>,
}

/// Process-wide run parameters, read-only once the run starts
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Milliseconds between readiness checks
    pub poll_interval: u64,

    /// Milliseconds of polling before extraction is forced
    pub poll_timeout_limit: u64,

    /// Logger registry name
    pub logger: String,

    /// Writer registry name
    pub writer: String,

    /// Formatter registry name
    pub format: String,

    /// Destination for the `file` logger
    pub log_file: Option<PathBuf>,

    /// Destination for the `file` and `itemfile` writers
    pub out_file: Option<PathBuf>,

    /// Flush threshold; unset means a single flush at the end of the run
    pub batch_size: Option<usize>,

    /// Explicit CSV header; inferred from the first item when unset
    pub csv_fields: Option<Vec<String>>,

    /// Scripts injected into every successfully loaded page
    pub base_scripts: Vec<PathBuf>,

    /// User agent sent by the static HTML page
    pub user_agent: String,

    /// Request timeout for the static HTML page (seconds)
    pub request_timeout: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval: 100,
            poll_timeout_limit: 3000,
            logger: "stdout".to_string(),
            writer: "stdout".to_string(),
            format: "json".to_string(),
            log_file: None,
            out_file: None,
            batch_size: None,
            csv_fields: None,
            base_scripts: Vec::new(),
            user_agent: format!("suitecrawl/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: 30,
        }
    }
}

impl RunConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    pub fn poll_timeout_limit(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_limit)
    }
}

/// One configuration source as it appears on disk
///
/// Every run key is optional so that later sources only override the keys
/// they actually set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "pollInterval")]
    pub poll_interval: Option<u64>,

    #[serde(rename = "pollTimeoutLimit")]
    pub poll_timeout_limit: Option<u64>,

    pub logger: Option<String>,

    pub writer: Option<String>,

    pub format: Option<String>,

    #[serde(rename = "logFile")]
    pub log_file: Option<PathBuf>,

    #[serde(rename = "outFile")]
    pub out_file: Option<PathBuf>,

    #[serde(rename = "batchSize")]
    pub batch_size: Option<usize>,

    #[serde(rename = "csvFields")]
    pub csv_fields: Option<Vec<String>>,

    #[serde(rename = "baseScripts")]
    pub base_scripts: Option<Vec<PathBuf>>,

    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,

    #[serde(rename = "requestTimeout")]
    pub request_timeout: Option<u64>,

    #[serde(default, rename = "suite")]
    pub suites: Vec<SuiteConfig>,
}

impl ConfigFile {
    /// Applies the run keys set in this source on top of `run`
    pub fn apply_to(&self, run: &mut RunConfig) {
        if let Some(v) = self.poll_interval {
            run.poll_interval = v;
        }
        if let Some(v) = self.poll_timeout_limit {
            run.poll_timeout_limit = v;
        }
        if let Some(v) = &self.logger {
            run.logger = v.clone();
        }
        if let Some(v) = &self.writer {
            run.writer = v.clone();
        }
        if let Some(v) = &self.format {
            run.format = v.clone();
        }
        if let Some(v) = &self.log_file {
            run.log_file = Some(v.clone());
        }
        if let Some(v) = &self.out_file {
            run.out_file = Some(v.clone());
        }
        if let Some(v) = self.batch_size {
            run.batch_size = Some(v);
        }
        if let Some(v) = &self.csv_fields {
            run.csv_fields = Some(v.clone());
        }
        if let Some(v) = &self.base_scripts {
            run.base_scripts = v.clone();
        }
        if let Some(v) = &self.user_agent {
            run.user_agent = v.clone();
        }
        if let Some(v) = self.request_timeout {
            run.request_timeout = v;
        }
    }
}

/// Per-suite configuration table (`[[suite]]`)
///
/// String values of predicates, hooks and scrapers are page expressions;
/// booleans and arrays are literals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuiteConfig {
    pub title: Option<String>,

    pub url: Option<String>,

    #[serde(default)]
    pub urls: Vec<String>,

    pub scraper: Option<LazyValue<Value>>,

    #[serde(default)]
    pub scrapers: Vec<LazyValue<Value>>,

    pub ready: Option<LazyValue<bool>>,

    pub scrapable: Option<LazyValue<bool>>,

    #[serde(rename = "preScrape")]
    pub pre_scrape: Option<LazyValue<Value>>,

    #[serde(rename = "loadScript", default, deserialize_with = "one_or_many")]
    pub load_script: Vec<PathBuf>,

    #[serde(rename = "moreUrls")]
    pub more_urls: Option<LazyValue<Vec<String>>>,

    #[serde(rename = "maxDepth")]
    pub max_depth: Option<u32>,

    #[serde(rename = "noConflict", default)]
    pub no_conflict: bool,
}

impl SuiteConfig {
    /// Returns `url` followed by `urls`
    pub fn all_urls(&self) -> Vec<String> {
        self.url.iter().chain(self.urls.iter()).cloned().collect()
    }

    /// Returns `scraper` followed by `scrapers`
    pub fn all_scrapers(&self) -> Vec<LazyValue<Value>> {
        self.scraper
            .iter()
            .chain(self.scrapers.iter())
            .cloned()
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    })
}
