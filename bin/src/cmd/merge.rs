//! Merge command implementation.

use super::banner;
use anyhow::Result;
use surprise_core::MergeConfig;
use surprise_merge::merge_all;

/// Enrich every configured event table with the stored returns.
pub(crate) fn run_merge(config: &MergeConfig) -> Result<()> {
    banner("Merge Returns Into Events");

    let batch = merge_all(config)?;

    for report in &batch.reports {
        println!("Input:    {}", report.input.display());
        println!("Output:   {}", report.output.display());
        println!("Rows:     {} ({} dropped for bad dates)", report.rows, report.dropped_rows);
        println!("Columns:  {}", report.columns);
        println!("Added:");
        for column in &report.added_columns {
            println!("  {}", column);
        }
        for skipped in &report.skipped_tables {
            println!("  skipped {} ({})", skipped.column, skipped.reason);
        }
        println!();
    }

    for failed in &batch.failed {
        println!("Skipped {}: {}", failed.input.display(), failed.reason);
    }

    Ok(())
}
