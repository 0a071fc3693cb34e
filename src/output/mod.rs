//! Output module for streaming scraped items
//!
//! This module handles:
//! - Formatting items (raw, JSON array, CSV) with start/delimiter/end framing
//! - Buffering and flushing items in batches
//! - Writing to stdout, a single file, or one file per item

mod batch;
mod formatter;
mod item_file;
mod sink;
mod traits;

pub use batch::BatchWriter;
pub use formatter::{CsvFormatter, JsonFormatter, RawFormatter};
pub use item_file::ItemFileWriter;
pub use sink::{FileSink, SharedBuffer, StdoutSink};
pub use traits::{flatten_item, Formatter, Item, OutputError, OutputResult, Sink, Writer};
