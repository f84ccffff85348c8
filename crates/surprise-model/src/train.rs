//! Training drivers for the evaluation and full-data importance stages.

use crate::dataset::{EventTable, FeatureSet, numeric_feature_columns};
use crate::encoding::TargetEncoder;
use crate::booster::GradientBoostingClassifier;
use crate::label::{LabelSource, class_counts, scale_pos_weight};
use crate::metrics::{ClassificationReport, RocCurve, accuracy, f1_weighted, recall, roc_auc};
use crate::split::stratified_split;
use serde::{Deserialize, Serialize};
use surprise_core::{BoosterParams, ImportanceConfig, ModelConfig, Result, SurpriseError};
use tracing::info;

/// Display names of the two classes in the classification report.
pub const CLASS_NAMES: [&str; 2] = ["Non-positive (0)", "Positive (1)"];

/// Split count of one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name.
    pub feature: String,
    /// Number of splits on the feature.
    pub importance: usize,
}

/// Pairs names with split counts, most important first; ties keep column order.
pub fn rank_importances(names: &[String], counts: &[usize]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(counts)
        .map(|(feature, importance)| FeatureImportance {
            feature: feature.clone(),
            importance: *importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.cmp(&a.importance));
    ranked
}

/// Held-out metrics of a trained classifier.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// ROC AUC; `None` when the test labels hold one class.
    pub auc: Option<f64>,
    /// Accuracy.
    pub accuracy: f64,
    /// Support-weighted F1.
    pub f1_weighted: f64,
    /// Recall of the positive class.
    pub recall: f64,
    /// Per-class report.
    pub report: ClassificationReport,
    /// ROC curve; `None` when the test labels hold one class.
    pub roc: Option<RocCurve>,
}

impl Evaluation {
    /// Computes every metric from labels, probabilities and class predictions.
    pub fn compute(labels: &[u8], proba: &[f64], predicted: &[u8]) -> Self {
        Self {
            auc: roc_auc(labels, proba),
            accuracy: accuracy(labels, predicted),
            f1_weighted: f1_weighted(labels, predicted),
            recall: recall(labels, predicted),
            report: ClassificationReport::compute(labels, predicted, CLASS_NAMES),
            roc: RocCurve::compute(labels, proba),
        }
    }
}

/// Everything the report stage needs from a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Held-out metrics.
    pub evaluation: Evaluation,
    /// Features ranked by split count.
    pub importances: Vec<FeatureImportance>,
    /// Hyperparameters used.
    pub params: BoosterParams,
    /// Positive-row weight used.
    pub scale_pos_weight: f64,
    /// Origin of the label.
    pub label_source: LabelSource,
    /// Training rows.
    pub n_train: usize,
    /// Held-out rows.
    pub n_test: usize,
}

fn select<T: Copy>(values: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|r| values[*r]).collect()
}

/// Loads the merged table and runs [`train_on_table`].
///
/// # Errors
///
/// Returns [`SurpriseError::FileNotFound`] when the merged table is
/// missing, plus every error of [`train_on_table`].
pub fn train_and_evaluate(config: &ModelConfig) -> Result<TrainingOutcome> {
    let table = EventTable::load(&config.data_path)?;
    info!(
        path = %config.data_path.display(),
        rows = table.height(),
        "loaded merged table"
    );
    train_on_table(&table, config)
}

/// Splits, encodes, trains and evaluates on one event table.
///
/// The target encoder only sees training rows. Positive rows are weighted
/// by `#neg / #pos` of the training split when the label is real.
///
/// # Errors
///
/// Returns [`SurpriseError::MissingColumn`] for absent feature columns and
/// [`SurpriseError::InsufficientData`] when either split is empty.
pub fn train_on_table(table: &EventTable, config: &ModelConfig) -> Result<TrainingOutcome> {
    let (labels, label_source) =
        table.labels(&config.label_column, config.synthetic_positive_rate, config.seed);
    let features = FeatureSet::build(table, config)?;

    let split = stratified_split(&labels, config.test_fraction, config.seed);
    if split.train.is_empty() || split.test.is_empty() {
        return Err(SurpriseError::InsufficientData(format!(
            "{} rows cannot be split into train and test",
            labels.len()
        )));
    }
    let y_train = select(&labels, &split.train);
    let y_test = select(&labels, &split.test);

    let mut encoder = TargetEncoder::default();
    encoder.fit(&features.categorical_rows(&split.train), &y_train)?;
    let x_train = features.matrix(&split.train, &encoder)?;
    let x_test = features.matrix(&split.test, &encoder)?;

    let weight = match label_source {
        LabelSource::Column => scale_pos_weight(&y_train),
        LabelSource::Synthetic => 1.0,
    };
    let (neg, pos) = class_counts(&y_train);
    info!(
        train = y_train.len(),
        test = y_test.len(),
        features = x_train.ncols(),
        negatives = neg,
        positives = pos,
        scale_pos_weight = weight,
        label = %label_source,
        "training classifier"
    );

    let mut model = GradientBoostingClassifier::new(config.params.clone()).with_scale_pos_weight(weight);
    model.fit(x_train.view(), &y_train)?;

    let proba = model.predict_proba(x_test.view())?;
    let predicted = model.predict(x_test.view())?;
    let evaluation = Evaluation::compute(&y_test, &proba, &predicted);
    info!(
        auc = ?evaluation.auc,
        accuracy = evaluation.accuracy,
        f1_weighted = evaluation.f1_weighted,
        recall = evaluation.recall,
        "evaluated on held-out rows"
    );

    Ok(TrainingOutcome {
        evaluation,
        importances: rank_importances(&features.feature_names(), &model.feature_importances()?),
        params: config.params.clone(),
        scale_pos_weight: weight,
        label_source,
        n_train: split.train.len(),
        n_test: split.test.len(),
    })
}

/// Result of the full-data importance stage.
#[derive(Debug, Clone)]
pub struct ImportanceOutcome {
    /// Features ranked by split count.
    pub importances: Vec<FeatureImportance>,
    /// Origin of the label.
    pub label_source: LabelSource,
    /// Rows trained on.
    pub rows: usize,
}

/// Loads the merged table and runs [`importance_on_table`].
///
/// # Errors
///
/// Returns [`SurpriseError::FileNotFound`] when the merged table is
/// missing, plus every error of [`importance_on_table`].
pub fn full_data_importance(config: &ImportanceConfig) -> Result<ImportanceOutcome> {
    let table = EventTable::load(&config.data_path)?;
    importance_on_table(&table, config)
}

/// Trains on every row using the all-numeric columns and ranks them.
///
/// # Errors
///
/// Returns [`SurpriseError::InsufficientData`] when no numeric column
/// remains.
pub fn importance_on_table(table: &EventTable, config: &ImportanceConfig) -> Result<ImportanceOutcome> {
    let (labels, label_source) =
        table.labels(&config.label_column, config.synthetic_positive_rate, config.seed);
    let columns = numeric_feature_columns(table, &config.label_column);
    if columns.is_empty() {
        return Err(SurpriseError::InsufficientData(
            "no numeric feature columns".into(),
        ));
    }

    let features = FeatureSet::numeric_only(table, &columns)?;
    let rows: Vec<usize> = (0..table.height()).collect();
    let x = features.matrix(&rows, &TargetEncoder::default())?;
    info!(
        rows = rows.len(),
        features = columns.len(),
        label = %label_source,
        "training full-data importance model"
    );

    let mut model = GradientBoostingClassifier::new(config.params.clone());
    model.fit(x.view(), &labels)?;

    Ok(ImportanceOutcome {
        importances: rank_importances(&columns, &model.feature_importances()?),
        label_source,
        rows: rows.len(),
    })
}
