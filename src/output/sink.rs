//! Output sinks: stdout, truncating file, shared in-memory buffer

use crate::output::traits::{OutputResult, Sink};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Writes every chunk to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write(&mut self, chunk: &str) -> OutputResult<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Appends to a file that is truncated once, when the sink is created
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self { file })
    }
}

impl Sink for FileSink {
    fn write(&mut self, chunk: &str) -> OutputResult<()> {
        self.file.write_all(chunk.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

/// In-memory sink whose clones share one buffer
///
/// Useful for embedding the crawler and reading the output back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<String>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything written so far
    pub fn contents(&self) -> String {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Sink for SharedBuffer {
    fn write(&mut self, chunk: &str) -> OutputResult<()> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_str(chunk);
        Ok(())
    }
}
