//! Built-in formatters: `raw`, `json` and `csv`

use crate::output::traits::{Formatter, Item, OutputResult};

const CRLF: &str = "\r\n";

/// Writes strings verbatim and everything else as JSON text, no framing
#[derive(Debug, Default)]
pub struct RawFormatter;

impl Formatter for RawFormatter {
    fn start(&self) -> String {
        String::new()
    }

    fn delimiter(&self) -> &str {
        ""
    }

    fn end(&self) -> &str {
        ""
    }

    fn format(&mut self, item: &Item) -> OutputResult<String> {
        Ok(match item {
            Item::String(text) => text.clone(),
            other => serde_json::to_string(other)?,
        })
    }
}

/// Frames items as one JSON array
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn start(&self) -> String {
        "[".to_string()
    }

    fn delimiter(&self) -> &str {
        ","
    }

    fn end(&self) -> &str {
        "]"
    }

    fn format(&mut self, item: &Item) -> OutputResult<String> {
        Ok(serde_json::to_string(item)?)
    }
}

/// Renders items as CRLF-separated CSV rows
///
/// The field list is either configured up front or inferred from the first
/// item: object keys in document order, `Column N` names for arrays, and a
/// single `Column 1` for scalars. The header row is the start token.
#[derive(Debug, Default)]
pub struct CsvFormatter {
    fields: Option<Vec<String>>,
}

impl CsvFormatter {
    /// Creates a formatter with an optional explicit field list
    pub fn new(fields: Option<Vec<String>>) -> Self {
        Self { fields }
    }

    /// The active field list, if known yet
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }
}

impl Formatter for CsvFormatter {
    fn start(&self) -> String {
        match &self.fields {
            Some(fields) if !fields.is_empty() => {
                let header: Vec<String> = fields
                    .iter()
                    .map(|field| encode_cell(&Item::String(field.clone())))
                    .collect::<OutputResult<_>>()
                    .unwrap_or_default();
                format!("{}{}", header.join(","), CRLF)
            }
            _ => String::new(),
        }
    }

    fn delimiter(&self) -> &str {
        CRLF
    }

    fn end(&self) -> &str {
        ""
    }

    fn format(&mut self, item: &Item) -> OutputResult<String> {
        let fields = self.fields.get_or_insert_with(|| infer_fields(item));

        let mut row: Vec<Item> = match item {
            Item::Object(map) => fields
                .iter()
                .map(|field| map.get(field).cloned().unwrap_or_else(empty_cell))
                .collect(),
            Item::Array(values) => values.clone(),
            other => vec![other.clone()],
        };
        row.resize_with(fields.len(), empty_cell);

        let cells = row
            .iter()
            .map(encode_cell)
            .collect::<OutputResult<Vec<_>>>()?;
        Ok(cells.join(","))
    }
}

fn empty_cell() -> Item {
    Item::String(String::new())
}

fn infer_fields(item: &Item) -> Vec<String> {
    match item {
        Item::Object(map) => map.keys().cloned().collect(),
        Item::Array(values) => (1..=values.len()).map(|n| format!("Column {}", n)).collect(),
        _ => vec!["Column 1".to_string()],
    }
}

/// JSON-encodes a cell, then turns `\"` escapes into CSV doubled quotes
fn encode_cell(value: &Item) -> OutputResult<String> {
    Ok(serde_json::to_string(value)?.replace("\\\"", "\"\""))
}
