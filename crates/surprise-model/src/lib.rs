//! Surprise classifier.
//!
//! Loads a merged event table, engineers calendar and ordinal features,
//! target-encodes the categorical columns on the training split and fits a
//! LightGBM binary classifier. Held-out rows are scored with AUC, accuracy,
//! weighted F1, positive recall and a per-class report.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod booster;
pub mod dataset;
pub mod encoding;
pub mod features;
pub mod label;
pub mod metrics;
pub mod split;
pub mod train;

pub use dataset::{EventTable, FeatureSet, numeric_feature_columns};
pub use encoding::TargetEncoder;
pub use booster::{GradientBoostingClassifier, lightgbm_params};
pub use label::LabelSource;
pub use metrics::{ClassificationReport, RocCurve};
pub use split::{Split, stratified_split};
pub use train::{
    CLASS_NAMES, Evaluation, FeatureImportance, ImportanceOutcome, TrainingOutcome,
    full_data_importance, importance_on_table, rank_importances, train_and_evaluate,
    train_on_table,
};
