//! Train command implementation.

use super::banner;
use anyhow::Result;
use surprise_core::ModelConfig;
use surprise_model::train_and_evaluate;
use surprise_report::write_training_report;

/// Train, evaluate and write the report artifacts.
pub(crate) fn run_train(config: &ModelConfig) -> Result<()> {
    banner("Surprise Classifier");

    println!("Data:     {}", config.data_path.display());
    println!("Label:    {}", config.label_column);
    println!();

    let outcome = train_and_evaluate(config)?;
    let eval = &outcome.evaluation;

    println!("Label source:      {}", outcome.label_source);
    println!("Train / test rows: {} / {}", outcome.n_train, outcome.n_test);
    println!("scale_pos_weight:  {:.4}", outcome.scale_pos_weight);
    println!();
    match eval.auc {
        Some(auc) => println!("AUC:               {:.4}", auc),
        None => println!("AUC:               n/a (single class in test split)"),
    }
    println!("Accuracy:          {:.4}", eval.accuracy);
    println!("F1 (weighted):     {:.4}", eval.f1_weighted);
    println!("Recall (positive): {:.4}", eval.recall);
    println!();
    println!("{}", eval.report);

    println!("Top features:");
    for item in outcome.importances.iter().take(config.top_n) {
        println!("  {:<40} {:>6}", item.feature, item.importance);
    }
    println!();

    let artifacts = write_training_report(&outcome, config)?;
    for path in &artifacts.written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
