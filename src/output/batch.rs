//! Batching writer
//!
//! Items are buffered in arrival order and flushed through a formatter to a
//! sink. With a batch size configured, an `add` that leaves the buffer
//! longer than the threshold flushes exactly one batch of that size; the rest
//! waits for later calls or for `finish`. Without a batch size the whole run
//! is flushed once, by `finish`.

use crate::output::traits::{flatten_item, Formatter, Item, OutputResult, Sink, Writer};
use std::collections::VecDeque;

/// Writer that flushes buffered items in batches
pub struct BatchWriter {
    formatter: Box<dyn Formatter>,
    sink: Box<dyn Sink>,
    buffer: VecDeque<Item>,
    batch_size: Option<usize>,
    count: usize,
    first_flush: bool,
    last_flush: bool,
}

impl BatchWriter {
    /// Creates a writer
    ///
    /// # Arguments
    ///
    /// * `formatter` - Encodes items and supplies the framing tokens
    /// * `sink` - Receives every flushed chunk
    /// * `batch_size` - Flush threshold, or `None` to flush only on finish
    pub fn new(
        formatter: Box<dyn Formatter>,
        sink: Box<dyn Sink>,
        batch_size: Option<usize>,
    ) -> Self {
        Self {
            formatter,
            sink,
            buffer: VecDeque::new(),
            batch_size,
            count: 0,
            first_flush: true,
            last_flush: false,
        }
    }

    /// Number of items waiting for a flush
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true once `finish` has run
    pub fn is_finished(&self) -> bool {
        self.last_flush
    }

    fn flush(&mut self, batch: Vec<Item>) -> OutputResult<()> {
        let mut formatted = Vec::with_capacity(batch.len());
        for item in &batch {
            formatted.push(self.formatter.format(item)?);
        }

        let mut chunk = String::new();
        if self.first_flush {
            // The start token may depend on the items just formatted (CSV header)
            chunk.push_str(&self.formatter.start());
            self.first_flush = false;
        } else if !formatted.is_empty() {
            chunk.push_str(self.formatter.delimiter());
        }
        chunk.push_str(&formatted.join(self.formatter.delimiter()));
        if self.last_flush {
            chunk.push_str(self.formatter.end());
        }

        tracing::debug!("Flushing {} items", batch.len());

        if chunk.is_empty() {
            return Ok(());
        }
        self.sink.write(&chunk)
    }
}

impl Writer for BatchWriter {
    fn add(&mut self, item: Item) -> OutputResult<()> {
        let items = flatten_item(item);
        self.count += items.len();
        self.buffer.extend(items);

        if let Some(size) = self.batch_size {
            if self.buffer.len() > size {
                let batch: Vec<Item> = self.buffer.drain(..size).collect();
                self.flush(batch)?;
            }
        }

        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.last_flush {
            return Ok(());
        }
        self.last_flush = true;

        let batch: Vec<Item> = self.buffer.drain(..).collect();
        self.flush(batch)
    }

    fn count(&self) -> usize {
        self.count
    }
}
