//! Ingest command implementation.

use super::banner;
use anyhow::Result;
use surprise_core::IngestConfig;
use surprise_ingest::{ingest_all, store};

/// Ingest every configured price file and write the return store.
pub(crate) fn run_ingest(config: &IngestConfig) -> Result<()> {
    banner("Ingest Historical Prices");

    let batch = ingest_all(config)?;

    println!("{:<40} {:>8} {:>8} {:>8}", "Asset", "Rows", "Kept", "Dropped");
    println!("{}", "-".repeat(67));
    for outcome in &batch.outcomes {
        println!(
            "{:<40} {:>8} {:>8} {:>8}",
            outcome.table.column_name(),
            outcome.input_rows,
            outcome.table.len(),
            outcome.rejections.len()
        );
    }
    println!();

    if !batch.skipped.is_empty() {
        println!("Skipped files:");
        for skipped in &batch.skipped {
            println!("  {} ({})", skipped.path.display(), skipped.reason);
        }
        println!();
    }

    let tables = batch.tables();
    store::save_tables(&config.store_path, &tables)?;
    println!(
        "Stored {} return tables ({} rows dropped) in {}",
        tables.len(),
        batch.total_rejections(),
        config.store_path.display()
    );

    Ok(())
}
