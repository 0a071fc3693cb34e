//! One-file-per-item writer

use crate::output::traits::{flatten_item, Formatter, Item, OutputResult, Writer};
use std::path::{Path, PathBuf};

/// Writes every item to its own file as soon as it is added
///
/// Each file holds one fully framed item (`start + format(item) + end`).
/// There is no buffering, so `finish` has nothing left to do.
pub struct ItemFileWriter {
    formatter: Box<dyn Formatter>,
    template: PathBuf,
    count: usize,
}

impl ItemFileWriter {
    /// Creates a writer naming files after `template`
    ///
    /// A `{n}` placeholder in the template is replaced by the 1-based item
    /// number; without one, `-{n}` is inserted before the extension.
    pub fn new(formatter: Box<dyn Formatter>, template: &Path) -> OutputResult<Self> {
        if let Some(parent) = template.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            formatter,
            template: template.to_path_buf(),
            count: 0,
        })
    }

    /// Returns the file path used for item number `n`
    pub fn path_for(&self, n: usize) -> PathBuf {
        item_path(&self.template, n)
    }
}

impl Writer for ItemFileWriter {
    fn add(&mut self, item: Item) -> OutputResult<()> {
        for item in flatten_item(item) {
            self.count += 1;
            let body = self.formatter.format(&item)?;
            let content = format!("{}{}{}", self.formatter.start(), body, self.formatter.end());

            let path = self.path_for(self.count);
            std::fs::write(&path, content)?;
            tracing::debug!("Wrote item {} to {}", self.count, path.display());
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }
}

fn item_path(template: &Path, n: usize) -> PathBuf {
    let raw = template.to_string_lossy();
    if raw.contains("{n}") {
        return PathBuf::from(raw.replace("{n}", &n.to_string()));
    }

    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "item".to_string());
    let name = match template.extension() {
        Some(ext) => format!("{}-{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}-{}", stem, n),
    };
    template.with_file_name(name)
}
