//! Importance command implementation.

use super::banner;
use anyhow::Result;
use surprise_core::ImportanceConfig;
use surprise_model::full_data_importance;
use surprise_report::write_importance_report;

/// Rank numeric features on the full dataset and write chart and table.
pub(crate) fn run_importance(config: &ImportanceConfig) -> Result<()> {
    banner("Feature Importance");

    let outcome = full_data_importance(config)?;
    println!("Rows:     {}", outcome.rows);
    println!("Label:    {} ({})", config.label_column, outcome.label_source);
    println!();

    println!("{:<40} {:>10}", "Feature", "Importance");
    println!("{}", "-".repeat(51));
    for item in outcome.importances.iter().take(config.top_n) {
        println!("{:<40} {:>10}", item.feature, item.importance);
    }
    println!();

    let artifacts = write_importance_report(&outcome, config)?;
    for path in &artifacts.written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
