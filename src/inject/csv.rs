//! Minimal RFC 4180 reader for the injector inputs.
//!
//! Handles quoted fields (embedded commas, newlines and `""` escapes), CRLF
//! line endings and a leading UTF-8 byte-order mark. Columns are looked up by
//! header name; extra columns are carried but never required.

use std::collections::HashMap;
use std::path::Path;

use super::error::{InjectError, InjectResult};

/// A parsed CSV file: header plus records.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    headers: Vec<String>,
    columns: HashMap<String, usize>,
    records: Vec<Vec<String>>,
}

/// One record, with header-based access.
#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'t> {
    table: &'t CsvTable,
    fields: &'t [String],
    number: usize,
}

impl CsvTable {
    /// Read and parse a file. A missing file and a file without a header row
    /// are errors.
    pub fn read(path: &Path) -> InjectResult<Self> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                InjectError::NotFound { path: shown.clone() }
            } else {
                InjectError::Io {
                    path: shown.clone(),
                    source,
                }
            }
        })?;
        let table = Self::parse(&text);
        if table.headers.is_empty() {
            return Err(InjectError::MissingHeader { path: shown });
        }
        tracing::debug!(path = %shown, rows = table.len(), "csv loaded");
        Ok(table)
    }

    /// Parse CSV text. The first record is the header; blank lines are dropped.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = parse_records(text).into_iter();
        let Some(headers) = records.next() else {
            return Self::default();
        };
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let mut columns = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            columns.entry(h.clone()).or_insert(i);
        }
        Self {
            headers,
            columns,
            records: records.collect(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Records in file order, numbered from 1 (the header is not counted).
    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.records.iter().enumerate().map(move |(i, fields)| CsvRow {
            table: self,
            fields,
            number: i + 1,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'t> CsvRow<'t> {
    /// The trimmed value of `column`, or `None` when the column is absent or
    /// the cell is blank.
    pub fn get(&self, column: &str) -> Option<&'t str> {
        let i = *self.table.columns.get(column)?;
        self.fields.get(i).map(|f| f.trim()).filter(|f| !f.is_empty())
    }

    /// First non-blank value among `columns`.
    pub fn first_of(&self, columns: &[&str]) -> Option<&'t str> {
        columns.iter().find_map(|c| self.get(c))
    }

    /// 1-based record number.
    pub fn number(&self) -> usize {
        self.number
    }
}

fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.iter().all(|f| f.trim().is_empty());
    if !blank {
        records.push(record);
    }
}
