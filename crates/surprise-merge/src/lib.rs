//! Merge stage.
//!
//! Each configured event table is enriched with one `lagged_return_<asset>`
//! column per return table, joined on the event date, and written back out
//! as CSV.

pub mod join;
pub mod main_table;

pub use join::{JoinOutcome, SkippedTable, ensure_unique_dates, merge_returns};
pub use main_table::{MainTable, find_date_column, parse_event_date};

use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use surprise_core::{MainTableConfig, MergeConfig, Result, ReturnTable};
use surprise_ingest::store::load_tables;
use tracing::{info, warn};

/// Summary of one merged main table.
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Event table read.
    pub input: PathBuf,
    /// Merged CSV written.
    pub output: PathBuf,
    /// Rows in the merged table.
    pub rows: usize,
    /// Columns in the merged table.
    pub columns: usize,
    /// Rows dropped for unparseable dates.
    pub dropped_rows: usize,
    /// Return columns added.
    pub added_columns: Vec<String>,
    /// Return tables skipped.
    pub skipped_tables: Vec<SkippedTable>,
}

/// A main table that could not be merged.
#[derive(Debug, Clone)]
pub struct FailedTable {
    /// Event table path.
    pub input: PathBuf,
    /// Error message.
    pub reason: String,
}

/// Writes a frame as CSV with a header, creating parent directories.
///
/// # Errors
///
/// Returns an I/O or polars error.
pub fn write_csv(frame: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(frame)?;
    Ok(())
}

/// Loads one main table, joins the return tables and writes the output.
///
/// # Errors
///
/// Returns the load, join or write error for this table.
pub fn merge_main_table(config: &MainTableConfig, tables: &[ReturnTable]) -> Result<MergeReport> {
    let main = MainTable::load(&config.path, config.date_column_index)?;
    if main.dropped_rows > 0 {
        warn!(
            table = %main.name,
            dropped = main.dropped_rows,
            "dropped rows with unparseable dates"
        );
    }

    let JoinOutcome { mut frame, added_columns, skipped } = merge_returns(&main.frame, tables)?;
    write_csv(&mut frame, &config.output)?;

    info!(
        table = %main.name,
        output = %config.output.display(),
        rows = frame.height(),
        added = ?added_columns,
        "merged table written"
    );

    Ok(MergeReport {
        input: config.path.clone(),
        output: config.output.clone(),
        rows: frame.height(),
        columns: frame.width(),
        dropped_rows: main.dropped_rows,
        added_columns,
        skipped_tables: skipped,
    })
}

/// Outcome of [`merge_all`].
#[derive(Debug, Clone, Default)]
pub struct MergeBatch {
    /// Tables merged and written.
    pub reports: Vec<MergeReport>,
    /// Tables skipped with their error.
    pub failed: Vec<FailedTable>,
}

/// Runs the merge stage for every configured main table.
///
/// A main table that cannot be read or has no date column is skipped with a
/// warning.
///
/// # Errors
///
/// Returns an error if the return store cannot be loaded.
pub fn merge_all(config: &MergeConfig) -> Result<MergeBatch> {
    let tables = load_tables(&config.store_path)?;
    info!(
        store = %config.store_path.display(),
        tables = tables.len(),
        "loaded return store"
    );

    let mut batch = MergeBatch::default();
    for main in &config.main_tables {
        match merge_main_table(main, &tables) {
            Ok(report) => batch.reports.push(report),
            Err(e) => {
                warn!(table = %main.path.display(), error = %e, "skipping main table");
                batch.failed.push(FailedTable {
                    input: main.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(batch)
}
