//! Report artifacts of the model stage: the plain-text results summary,
//! the importance and ROC charts (SVG) and the importance table (CSV).

pub mod charts;
pub mod svg;

pub use charts::{importance_chart, roc_chart};

use std::fs;
use std::path::{Path, PathBuf};
use surprise_core::{BoosterParams, ImportanceConfig, ModelConfig, Result};
use surprise_model::{FeatureImportance, ImportanceOutcome, TrainingOutcome};
use tracing::{info, warn};

fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

fn format_params(params: &BoosterParams) -> String {
    [
        ("n_estimators", params.n_estimators.to_string()),
        ("num_leaves", params.num_leaves.to_string()),
        ("learning_rate", params.learning_rate.to_string()),
        ("min_child_samples", params.min_child_samples.to_string()),
        ("subsample", params.subsample.to_string()),
        ("subsample_freq", params.subsample_freq.to_string()),
        ("colsample_bytree", params.colsample_bytree.to_string()),
        ("seed", params.seed.to_string()),
    ]
    .iter()
    .map(|(name, value)| format!("- {name}: {value}\n"))
    .collect()
}

/// Renders the results summary written next to the charts.
pub fn render_summary(outcome: &TrainingOutcome) -> String {
    let eval = &outcome.evaluation;
    format!(
        "# Final Model Results (LightGBM)\n\
         \n\
         ## Performance Metrics\n\
         - AUC Score: {auc}\n\
         - Accuracy: {accuracy:.4}\n\
         - F1-Score (Weighted): {f1:.4}\n\
         - Recall (Positive Surprise): {recall:.4}\n\
         \n\
         ## Training Data\n\
         - Label: {label}\n\
         - Train rows: {n_train}\n\
         - Test rows: {n_test}\n\
         - scale_pos_weight: {weight:.4}\n\
         \n\
         ## Hyperparameters\n\
         {params}\
         \n\
         ## Classification Report\n\
         {report}",
        auc = format_metric(eval.auc),
        accuracy = eval.accuracy,
        f1 = eval.f1_weighted,
        recall = eval.recall,
        label = outcome.label_source,
        n_train = outcome.n_train,
        n_test = outcome.n_test,
        weight = outcome.scale_pos_weight,
        params = format_params(&outcome.params),
        report = eval.report,
    )
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Writes `Feature,Importance` rows in the given order.
///
/// # Errors
///
/// Returns an I/O or CSV error.
pub fn write_importance_csv(path: impl AsRef<Path>, importances: &[FeatureImportance]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Feature", "Importance"])?;
    for item in importances {
        let importance = item.importance.to_string();
        writer.write_record([item.feature.as_str(), importance.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Files written by a report step.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    /// Paths written, in order.
    pub written: Vec<PathBuf>,
}

/// Writes the summary, importance chart and ROC chart of a training run.
///
/// The ROC chart is skipped with a warning when the test split held a
/// single class.
///
/// # Errors
///
/// Returns the first I/O error.
pub fn write_training_report(outcome: &TrainingOutcome, config: &ModelConfig) -> Result<Artifacts> {
    let mut artifacts = Artifacts::default();

    write_text(&config.report_path, &render_summary(outcome))?;
    artifacts.written.push(config.report_path.clone());

    let chart = importance_chart(
        &outcome.importances,
        config.top_n,
        "Feature Importance (Final Model)",
        "Importance",
    );
    write_text(&config.importance_plot, &chart)?;
    artifacts.written.push(config.importance_plot.clone());

    match (&outcome.evaluation.roc, outcome.evaluation.auc) {
        (Some(curve), Some(_)) => {
            write_text(&config.roc_plot, &roc_chart(curve, curve.auc()))?;
            artifacts.written.push(config.roc_plot.clone());
        }
        _ => warn!("test split holds a single class, skipping ROC chart"),
    }

    info!(files = artifacts.written.len(), "training report written");
    Ok(artifacts)
}

/// Writes the importance chart and table of the full-data importance stage.
///
/// # Errors
///
/// Returns the first I/O or CSV error.
pub fn write_importance_report(outcome: &ImportanceOutcome, config: &ImportanceConfig) -> Result<Artifacts> {
    let chart = importance_chart(
        &outcome.importances,
        config.top_n,
        "Feature Importance (LightGBM)",
        "Importance (split count)",
    );
    write_text(&config.plot_path, &chart)?;
    write_importance_csv(&config.csv_path, &outcome.importances)?;

    info!(
        plot = %config.plot_path.display(),
        table = %config.csv_path.display(),
        "importance report written"
    );
    Ok(Artifacts {
        written: vec![config.plot_path.clone(), config.csv_path.clone()],
    })
}
