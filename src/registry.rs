//! Named factories for loggers, formatters and writers
//!
//! The run configuration selects each of the three by name. Built-ins are
//! registered by [`Registry::with_builtins`]; embedders may add their own
//! before the run starts. All three names are checked by
//! [`Registry::validate`] before the first suite runs.
//!
//! | Kind | Built-ins |
//! |------|-----------|
//! | logger | `stdout`, `file`, `none` |
//! | formatter | `raw`, `json`, `csv` |
//! | writer | `stdout`, `file`, `itemfile` |

use crate::config::RunConfig;
use crate::logging::{self, LoggingError};
use crate::output::{
    BatchWriter, CsvFormatter, FileSink, Formatter, ItemFileWriter, JsonFormatter, OutputError,
    OutputResult, RawFormatter, StdoutSink, Writer,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while resolving or building registry entries
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown {kind} '{name}'")]
    Unknown { kind: &'static str, name: String },

    #[error("Failed to initialize logger: {0}")]
    Init(#[from] LoggingError),

    #[error("Failed to create writer: {0}")]
    Writer(#[from] OutputError),
}

/// Installs a log subscriber
pub type LoggerFactory =
    Box<dyn Fn(&RunConfig, EnvFilter) -> Result<(), LoggingError> + Send + Sync>;

/// Builds a formatter
pub type FormatterFactory = Box<dyn Fn(&RunConfig) -> Box<dyn Formatter> + Send + Sync>;

/// Builds a writer around an already built formatter
pub type WriterFactory =
    Box<dyn Fn(&RunConfig, Box<dyn Formatter>) -> OutputResult<Box<dyn Writer>> + Send + Sync>;

pub struct Registry {
    loggers: HashMap<String, LoggerFactory>,
    formatters: HashMap<String, FormatterFactory>,
    writers: HashMap<String, WriterFactory>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            loggers: HashMap::new(),
            formatters: HashMap::new(),
            writers: HashMap::new(),
        }
    }

    /// A registry holding every built-in entry
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_logger("stdout", |_, filter| logging::init_console(filter));
        registry.register_logger("file", |config, filter| {
            let path = config
                .log_file
                .as_deref()
                .ok_or(LoggingError::MissingPath("logFile"))?;
            logging::init_file(path, filter)
        });
        registry.register_logger("none", |_, _| Ok(()));

        registry.register_formatter("raw", |_| Box::new(RawFormatter));
        registry.register_formatter("json", |_| Box::new(JsonFormatter));
        registry.register_formatter("csv", |config| {
            Box::new(CsvFormatter::new(config.csv_fields.clone()))
        });

        registry.register_writer("stdout", |config, formatter| {
            let writer: Box<dyn Writer> =
                Box::new(BatchWriter::new(formatter, Box::new(StdoutSink), config.batch_size));
            Ok(writer)
        });
        registry.register_writer("file", |config, formatter| {
            let path = config
                .out_file
                .as_deref()
                .ok_or(OutputError::MissingPath("outFile"))?;
            let sink = FileSink::create(path)?;
            let writer: Box<dyn Writer> =
                Box::new(BatchWriter::new(formatter, Box::new(sink), config.batch_size));
            Ok(writer)
        });
        registry.register_writer("itemfile", |config, formatter| {
            let path = config
                .out_file
                .as_deref()
                .ok_or(OutputError::MissingPath("outFile"))?;
            let writer: Box<dyn Writer> = Box::new(ItemFileWriter::new(formatter, path)?);
            Ok(writer)
        });

        registry
    }

    pub fn register_logger<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&RunConfig, EnvFilter) -> Result<(), LoggingError> + Send + Sync + 'static,
    {
        self.loggers.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_formatter<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&RunConfig) -> Box<dyn Formatter> + Send + Sync + 'static,
    {
        self.formatters.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_writer<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&RunConfig, Box<dyn Formatter>) -> OutputResult<Box<dyn Writer>>
            + Send
            + Sync
            + 'static,
    {
        self.writers.insert(name.to_string(), Box::new(factory));
    }

    /// Checks that the configured logger, formatter and writer all exist
    pub fn validate(&self, config: &RunConfig) -> Result<(), RegistryError> {
        lookup(&self.loggers, "logger", &config.logger)?;
        lookup(&self.formatters, "formatter", &config.format)?;
        lookup(&self.writers, "writer", &config.writer)?;
        Ok(())
    }

    /// Installs the configured logger
    pub fn init_logger(&self, config: &RunConfig, filter: EnvFilter) -> Result<(), RegistryError> {
        let factory = lookup(&self.loggers, "logger", &config.logger)?;
        Ok(factory(config, filter)?)
    }

    pub fn create_formatter(&self, config: &RunConfig) -> Result<Box<dyn Formatter>, RegistryError> {
        let factory = lookup(&self.formatters, "formatter", &config.format)?;
        Ok(factory(config))
    }

    /// Builds the configured writer; file writers truncate their output here
    pub fn create_writer(&self, config: &RunConfig) -> Result<Box<dyn Writer>, RegistryError> {
        let formatter = self.create_formatter(config)?;
        let factory = lookup(&self.writers, "writer", &config.writer)?;
        Ok(factory(config, formatter)?)
    }

    /// Registered names of one kind, sorted
    pub fn names(&self, kind: &str) -> Vec<String> {
        let mut names: Vec<String> = match kind {
            "logger" => self.loggers.keys().cloned().collect(),
            "formatter" => self.formatters.keys().cloned().collect(),
            "writer" => self.writers.keys().cloned().collect(),
            _ => Vec::new(),
        };
        names.sort();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn lookup<'a, V>(
    map: &'a HashMap<String, V>,
    kind: &'static str,
    name: &str,
) -> Result<&'a V, RegistryError> {
    map.get(name).ok_or_else(|| RegistryError::Unknown {
        kind,
        name: name.to_string(),
    })
}
