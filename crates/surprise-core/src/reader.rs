//! Tolerant CSV reading.
//!
//! Source files come from different exporters: some are latin-1, some UTF-8,
//! some have ragged rows or blank header cells. Everything is read into a
//! [`RawTable`] of strings first; typing happens in the stage that knows what
//! each column means.

use crate::{Result, SurpriseError};
use csv::ReaderBuilder;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Decodes file bytes, preferring UTF-8 and falling back to latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback never fails. A UTF-8 byte-order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// A CSV file as rows of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Reads a CSV file from disk.
    ///
    /// When `has_header` is false the columns are named `column_0`,
    /// `column_1`, and so on.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::FileNotFound`] if the file does not exist, or
    /// an I/O or CSV error.
    pub fn read(path: impl AsRef<Path>, has_header: bool) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SurpriseError::FileNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Self::parse(&decode_text(&bytes), has_header)
    }

    /// Parses CSV text.
    ///
    /// Rows shorter than the header are padded with empty cells; longer rows
    /// are truncated. Blank header cells become `Unnamed: <i>` and repeated
    /// names get a numeric suffix so the table can become a frame.
    ///
    /// # Errors
    ///
    /// Returns a CSV error for unterminated quotes and similar syntax errors.
    pub fn parse(text: &str, has_header: bool) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let mut records = records.into_iter();
        let raw_headers: Vec<String> = if has_header {
            records.next().unwrap_or_default()
        } else {
            Vec::new()
        };
        let rows: Vec<Vec<String>> = records.collect();

        let width = if has_header {
            raw_headers.len()
        } else {
            rows.iter().map(Vec::len).max().unwrap_or(0)
        };
        let headers = if has_header {
            unique_headers(&raw_headers)
        } else {
            (0..width).map(|i| format!("column_{i}")).collect()
        };

        let mut ragged = 0usize;
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() != width {
                    ragged += 1;
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        if ragged > 0 {
            debug!(ragged, width, "normalized ragged rows");
        }

        Ok(Self { headers, rows })
    }

    /// Column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, each exactly [`Self::width`] cells long.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by exact header name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    /// Converts the table into a frame of string columns; empty cells are null.
    ///
    /// # Errors
    ///
    /// Propagates Polars construction errors.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<Option<String>> = self
                    .column(i)
                    .map(|cell| (!cell.trim().is_empty()).then(|| cell.to_string()))
                    .collect();
                Column::new(name.as_str().into(), values)
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

fn unique_headers(raw: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());
    for (i, header) in raw.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            header.trim().to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.push(name);
    }
    seen
}
