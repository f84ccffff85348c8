//! Ingest & normalize stage.
//!
//! Turns heterogeneous historical price files into [`ReturnTable`]s of
//! previous-day returns:
//! - decode (UTF-8, else latin-1) and read every record as text
//! - resolve the date and price columns from the source schema
//! - clean and parse each cell, dropping and logging rows that fail
//! - sort by date, collapse repeated dates, compute the one-day-lagged return
//!
//! # Example
//!
//! ```rust,ignore
//! use surprise_core::PipelineConfig;
//! use surprise_ingest::{ingest_all, store};
//!
//! let config = PipelineConfig::default();
//! let batch = ingest_all(&config.ingest)?;
//! store::save_tables(&config.ingest.store_path, &batch.tables())?;
//! ```

pub mod clean;
pub mod returns;
pub mod sources;
pub mod store;

pub use sources::{ResolvedSource, discover_sources};

use std::path::PathBuf;
use surprise_core::config::{IngestConfig, SourceSchema};
use surprise_core::{Date, Field, RawTable, RejectionLog, Result, ReturnTable, SurpriseError};
use tracing::{debug, info, warn};

/// Result of cleaning one source.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The lagged return table.
    pub table: ReturnTable,
    /// Rows dropped while cleaning.
    pub rejections: RejectionLog,
    /// Data rows read from the file.
    pub input_rows: usize,
}

/// A source that could not be used.
#[derive(Debug, Clone)]
pub struct SkippedSource {
    /// Path of the file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of a full ingest run.
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    /// Successfully processed sources, in processing order.
    pub outcomes: Vec<IngestOutcome>,
    /// Sources skipped with a warning.
    pub skipped: Vec<SkippedSource>,
}

impl IngestBatch {
    /// The return tables of every processed source.
    pub fn tables(&self) -> Vec<ReturnTable> {
        self.outcomes.iter().map(|o| o.table.clone()).collect()
    }

    /// Total rows dropped across all sources.
    pub fn total_rejections(&self) -> usize {
        self.outcomes.iter().map(|o| o.rejections.len()).sum()
    }
}

/// Cleans an already-read table into a lagged return table.
///
/// # Errors
///
/// - [`SurpriseError::InsufficientData`] for fewer than two columns or no rows
/// - [`SurpriseError::MissingColumn`] if a schema column cannot be resolved
/// - [`SurpriseError::InvalidData`] if no date in the date column parses
pub fn ingest_raw(
    raw: &RawTable,
    asset: &str,
    schema: &SourceSchema,
    source: &str,
) -> Result<IngestOutcome> {
    if raw.width() < 2 {
        return Err(SurpriseError::InsufficientData(format!(
            "{source} has fewer than 2 columns"
        )));
    }
    if raw.height() == 0 {
        return Err(SurpriseError::InsufficientData(format!(
            "{source} has no data rows"
        )));
    }

    let date_idx = schema
        .date_column
        .resolve(raw.headers())
        .ok_or_else(|| SurpriseError::MissingColumn(format!("{source}: date column {}", schema.date_column)))?;
    let price_idx = schema
        .price_column
        .resolve(raw.headers())
        .ok_or_else(|| SurpriseError::MissingColumn(format!("{source}: price column {}", schema.price_column)))?;

    let mut rejections = RejectionLog::new(source);
    let mut dated = 0usize;
    // (date, price, original row) of every row that survives cleaning
    let mut kept: Vec<(Date, f64, usize)> = Vec::with_capacity(raw.height());

    for (i, row) in raw.rows().iter().enumerate() {
        let row_no = i + 1;
        let Some(date) = clean::parse_trade_date(&row[date_idx], &schema.date_format) else {
            rejections.reject(row_no, Field::Date, row[date_idx].as_str());
            continue;
        };
        dated += 1;
        let Some(price) = clean::parse_price(&row[price_idx], schema.decimal) else {
            rejections.reject(row_no, Field::Price, row[price_idx].as_str());
            continue;
        };
        kept.push((date, price, row_no));
    }

    if dated == 0 {
        return Err(SurpriseError::InvalidData(format!(
            "{source}: no value in date column {} could be parsed",
            schema.date_column
        )));
    }

    // Stable: among equal dates the earliest row in the file wins.
    kept.sort_by_key(|(date, _, _)| *date);
    let mut dates = Vec::with_capacity(kept.len());
    let mut prices = Vec::with_capacity(kept.len());
    for (date, price, row_no) in kept {
        if dates.last() == Some(&date) {
            rejections.reject(row_no, Field::DuplicateDate, date.to_string());
            continue;
        }
        dates.push(date);
        prices.push(price);
    }

    if dates.is_empty() {
        warn!(source, "no rows survived price cleaning");
    }

    let table = ReturnTable::new(asset, dates, returns::lagged_returns(&prices))?;
    Ok(IngestOutcome {
        table,
        rejections,
        input_rows: raw.height(),
    })
}

/// Reads and cleans one historical file.
///
/// # Errors
///
/// Returns read errors as well as everything [`ingest_raw`] rejects.
pub fn ingest_file(source: &ResolvedSource) -> Result<IngestOutcome> {
    let raw = RawTable::read(&source.path, source.schema.has_header)?;
    let name = source
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.path.display().to_string());
    ingest_raw(&raw, &source.asset, &source.schema, &name)
}

/// Processes every configured source; unusable files are skipped with a warning.
///
/// # Errors
///
/// Only fails if source discovery itself fails.
pub fn ingest_all(config: &IngestConfig) -> Result<IngestBatch> {
    let sources = discover_sources(config)?;
    info!(count = sources.len(), "ingesting historical files");

    let mut batch = IngestBatch::default();
    for source in &sources {
        debug!(path = %source.path.display(), asset = %source.asset, "processing");
        match ingest_file(source) {
            Ok(outcome) => {
                info!(
                    asset = %source.asset,
                    column = %outcome.table.column_name(),
                    rows = outcome.table.len(),
                    dropped = outcome.rejections.len(),
                    "processed"
                );
                if !outcome.rejections.is_empty() {
                    debug!("{}", outcome.rejections);
                }
                batch.outcomes.push(outcome);
            }
            Err(e) => {
                warn!(path = %source.path.display(), error = %e, "skipping source");
                batch.skipped.push(SkippedSource {
                    path: source.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use surprise_core::config::{ColumnRef, DecimalConvention, SourceConfig};

    fn ingest_text(text: &str) -> Result<IngestOutcome> {
        let raw = RawTable::parse(text, true).unwrap();
        ingest_raw(&raw, "Test", &SourceSchema::default(), "test.csv")
    }

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2020, 1, day).unwrap()
    }

    #[test]
    fn test_end_to_end_three_rows() {
        let outcome =
            ingest_text("Date,Price\n01.01.2020,100\n02.01.2020,110\n03.01.2020,99\n").unwrap();
        let table = &outcome.table;
        assert_eq!(table.column_name(), "lagged_return_Test");
        assert_eq!(table.dates(), &[d(1), d(2), d(3)]);
        assert!(table.returns()[0].is_none());
        assert!(table.returns()[1].is_none());
        assert_relative_eq!(table.returns()[2].unwrap(), 0.10, epsilon = 1e-12);
        assert!(outcome.rejections.is_empty());
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let outcome = ingest_text(
            "Data,Último\n\"03.01.2020\",\"99\"\n\"01.01.2020\",\"100\"\n\"02.01.2020\",\"110\"\n",
        )
        .unwrap();
        assert_eq!(outcome.table.dates(), &[d(1), d(2), d(3)]);
        assert_relative_eq!(outcome.table.returns()[2].unwrap(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_bad_rows_dropped_and_counted() {
        let outcome = ingest_text(
            "Date,Price\n01.01.2020,100\nnot a date,105\n02.01.2020,-\n03.01.2020,\"1.100,0\"\n04.01.2020,990\n",
        )
        .unwrap();
        assert_eq!(outcome.input_rows, 5);
        assert_eq!(outcome.table.len(), 3);
        assert_eq!(outcome.rejections.count(Field::Date), 1);
        assert_eq!(outcome.rejections.count(Field::Price), 1);
        assert_eq!(outcome.table.len() + outcome.rejections.len(), outcome.input_rows);
        assert_eq!(outcome.rejections.entries()[0].row, 2);
        assert_eq!(outcome.rejections.entries()[1].row, 3);
        // 01.01 -> 100, 03.01 -> 1100, 04.01 -> 990
        assert_relative_eq!(outcome.table.returns()[2].unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_duplicate_dates_collapsed() {
        let outcome = ingest_text(
            "Date,Price\n01.01.2020,100\n02.01.2020,110\n02.01.2020,500\n03.01.2020,121\n04.01.2020,1\n",
        )
        .unwrap();
        assert_eq!(outcome.table.len(), 4);
        assert_eq!(outcome.table.duplicate_dates(), 0);
        assert_eq!(outcome.rejections.count(Field::DuplicateDate), 1);
        assert_eq!(outcome.rejections.entries()[0].row, 3);
        // first 02.01 row kept: 110 / 100 - 1
        assert_relative_eq!(outcome.table.returns()[2].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(outcome.table.returns()[3].unwrap(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_single_column_skipped() {
        let result = ingest_text("Date\n01.01.2020\n");
        assert!(matches!(result, Err(SurpriseError::InsufficientData(_))));
    }

    #[test]
    fn test_unparseable_date_column() {
        let result = ingest_text("Date,Price\nfoo,1\nbar,2\n");
        assert!(matches!(result, Err(SurpriseError::InvalidData(_))));
    }

    #[test]
    fn test_named_columns_and_point_decimal() {
        let raw = RawTable::parse(
            "Open,Close,Date\n1,\"1,000.5\",2020-01-01\n1,\"1,100.55\",2020-01-02\n1,\"990.495\",2020-01-03\n",
            true,
        )
        .unwrap();
        let schema = SourceSchema {
            date_column: ColumnRef::Name("Date".to_string()),
            price_column: ColumnRef::Name("Close".to_string()),
            date_format: "%Y-%m-%d".to_string(),
            decimal: DecimalConvention::Point,
            ..Default::default()
        };
        let outcome = ingest_raw(&raw, "Gold", &schema, "gold.csv").unwrap();
        assert_eq!(outcome.table.len(), 3);
        assert_relative_eq!(
            outcome.table.returns()[2].unwrap(),
            1100.55 / 1000.5 - 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_named_column() {
        let raw = RawTable::parse("Date,Price\n01.01.2020,1\n", true).unwrap();
        let schema = SourceSchema {
            price_column: ColumnRef::Name("Close".to_string()),
            ..Default::default()
        };
        let result = ingest_raw(&raw, "Gold", &schema, "gold.csv");
        assert!(matches!(result, Err(SurpriseError::MissingColumn(_))));
    }

    #[test]
    fn test_ingest_all_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("DadosHistóricos-Ibovespa.csv");
        let bad = dir.path().join("DadosHistóricos-Broken.csv");
        fs::write(
            &good,
            "\"Data\",\"Último\",\"Abertura\"\n\"02.01.2020\",\"118.573\",\"115.652\"\n\"03.01.2020\",\"117.707\",\"118.564\"\n",
        )
        .unwrap();
        fs::write(&bad, "only_one_column\nvalue\n").unwrap();
        let missing = SourceConfig {
            path: dir.path().join("missing.csv"),
            asset: None,
            schema: None,
        };

        let config = IngestConfig {
            source_dir: Some(dir.path().to_path_buf()),
            patterns: vec!["DadosHistóricos-*.csv".to_string()],
            sources: vec![missing],
            ..Default::default()
        };
        let batch = ingest_all(&config).unwrap();
        assert_eq!(batch.outcomes.len(), 1);
        assert_eq!(batch.skipped.len(), 2);
        let table = &batch.outcomes[0].table;
        assert_eq!(table.asset(), "Ibovespa");
        assert_eq!(table.len(), 2);
        assert_eq!(batch.tables().len(), 1);
        assert_eq!(batch.total_rejections(), 0);
    }
}
