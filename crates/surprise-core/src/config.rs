//! Declarative pipeline configuration.
//!
//! Paths, source schemas and model hyperparameters are read from a JSON file
//! instead of being baked into each stage. Every section implements
//! [`Default`] and is `#[serde(default)]`, so a config file only needs the
//! keys it changes.
//!
//! ```json
//! {
//!   "ingest": { "source_dir": "data/upload" },
//!   "model": { "params": { "n_estimators": 100 } }
//! }
//! ```

use crate::{Result, SurpriseError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration for all stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ingest & normalize stage.
    pub ingest: IngestConfig,
    /// Merge stage.
    pub merge: MergeConfig,
    /// Model & report stage.
    pub model: ModelConfig,
    /// Full-data feature importance stage.
    pub importance: ImportanceConfig,
}

impl PipelineConfig {
    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::FileNotFound`] if the file does not exist, or a
    /// JSON error if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SurpriseError::FileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        Ok(config)
    }

    /// Parses a configuration from a JSON string and validates it.
    ///
    /// # Errors
    ///
    /// Returns a JSON error for malformed input or
    /// [`SurpriseError::Config`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        if !(0.0 < model.test_fraction && model.test_fraction < 1.0) {
            return Err(SurpriseError::Config(format!(
                "model.test_fraction must be in (0, 1), got {}",
                model.test_fraction
            )));
        }
        for (name, rate) in [
            ("model.synthetic_positive_rate", model.synthetic_positive_rate),
            ("importance.synthetic_positive_rate", self.importance.synthetic_positive_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SurpriseError::Config(format!(
                    "{name} must be in [0, 1], got {rate}"
                )));
            }
        }
        model.params.validate()?;
        self.importance.params.validate()?;
        Ok(())
    }
}

/// Decimal separator convention of a price column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalConvention {
    /// `1.234,56`: point groups thousands, comma marks decimals.
    #[default]
    Comma,
    /// `1,234.56`: comma groups thousands, point marks decimals.
    Point,
}

impl DecimalConvention {
    /// The decimal mark.
    pub const fn decimal_mark(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Point => '.',
        }
    }

    /// The thousands separator.
    pub const fn thousands_separator(&self) -> char {
        match self {
            Self::Comma => '.',
            Self::Point => ',',
        }
    }
}

/// Reference to a CSV column by position or by header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// Zero-based column position.
    Index(usize),
    /// Header name.
    Name(String),
}

impl ColumnRef {
    /// Resolves the reference against a header row.
    pub fn resolve(&self, headers: &[String]) -> Option<usize> {
        match self {
            Self::Index(i) => (*i < headers.len()).then_some(*i),
            Self::Name(name) => headers.iter().position(|h| h.trim() == name),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Column roles and locale of one historical price file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSchema {
    /// Whether the first record is a header row.
    pub has_header: bool,
    /// Column holding the trading date.
    pub date_column: ColumnRef,
    /// Column holding the closing price.
    pub price_column: ColumnRef,
    /// Explicit `chrono` format tried before the flexible day-first parser.
    pub date_format: String,
    /// Decimal convention of the price column.
    pub decimal: DecimalConvention,
}

impl Default for SourceSchema {
    fn default() -> Self {
        Self {
            has_header: true,
            date_column: ColumnRef::Index(0),
            price_column: ColumnRef::Index(1),
            date_format: "%d.%m.%Y".to_string(),
            decimal: DecimalConvention::Comma,
        }
    }
}

/// One explicitly listed historical file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path of the CSV file.
    pub path: PathBuf,
    /// Asset name; derived from the file name when absent.
    #[serde(default)]
    pub asset: Option<String>,
    /// Schema override; the ingest default schema applies when absent.
    #[serde(default)]
    pub schema: Option<SourceSchema>,
}

/// Configuration of the ingest stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory scanned for historical files.
    pub source_dir: Option<PathBuf>,
    /// Glob patterns, relative to `source_dir`, selecting historical files.
    pub patterns: Vec<String>,
    /// Files listed explicitly, optionally with their own schema.
    pub sources: Vec<SourceConfig>,
    /// Substrings removed from file stems when deriving asset names.
    pub name_strip: Vec<String>,
    /// Schema applied to every source without an override.
    pub default_schema: SourceSchema,
    /// Where the return tables are stored for the merge stage.
    pub store_path: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_dir: Some(PathBuf::from("data/upload")),
            patterns: vec![
                "DadosHistóricos-*.csv".to_string(),
                "PrincipaisÍndicesMundiaisHoje.csv".to_string(),
                "ÍndicesdeCommodities.csv".to_string(),
            ],
            sources: Vec::new(),
            name_strip: vec!["DadosHistóricos-".to_string(), "(1)".to_string()],
            default_schema: SourceSchema::default(),
            store_path: PathBuf::from("build/processed_returns.json"),
        }
    }
}

/// One main event table and where its merged output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTableConfig {
    /// Path of the event CSV.
    pub path: PathBuf,
    /// Path of the merged CSV written for it.
    pub output: PathBuf,
    /// Positional fallback for the date column when no `Data`/`data` header exists.
    #[serde(default)]
    pub date_column_index: Option<usize>,
}

/// Configuration of the merge stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Return store written by the ingest stage.
    pub store_path: PathBuf,
    /// Main tables to enrich.
    pub main_tables: Vec<MainTableConfig>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("build/processed_returns.json"),
            main_tables: vec![
                MainTableConfig {
                    path: PathBuf::from("data/upload/final_data_with_SESI.csv"),
                    output: PathBuf::from("build/final_data_merged_1.csv"),
                    date_column_index: Some(1),
                },
                MainTableConfig {
                    path: PathBuf::from("data/upload/time_series_analysis.csv"),
                    output: PathBuf::from("build/final_data_merged_2.csv"),
                    date_column_index: Some(0),
                },
            ],
        }
    }
}

/// Gradient-boosting hyperparameters, named after the LightGBM
/// scikit-learn interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    /// Number of boosting rounds (trees).
    pub n_estimators: usize,
    /// Maximum leaves per tree (leaf-wise growth).
    pub num_leaves: usize,
    /// Shrinkage rate.
    pub learning_rate: f64,
    /// Minimum number of samples in a leaf.
    pub min_child_samples: usize,
    /// Row sampling fraction per bagging round.
    pub subsample: f64,
    /// Re-sample rows every `subsample_freq` trees; 0 disables bagging.
    pub subsample_freq: usize,
    /// Feature sampling fraction per tree.
    pub colsample_bytree: f64,
    /// Random seed.
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 377,
            num_leaves: 20,
            learning_rate: 0.013_832_094_546_570_485,
            min_child_samples: 57,
            subsample: 0.980_586_012_174_674_7,
            subsample_freq: 0,
            colsample_bytree: 0.922_266_924_339_075_8,
            seed: 42,
        }
    }
}

impl BoosterParams {
    /// Checks hyperparameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::Config`] for the first value out of range.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(SurpriseError::Config("n_estimators must be > 0".into()));
        }
        if self.num_leaves < 2 {
            return Err(SurpriseError::Config("num_leaves must be >= 2".into()));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(SurpriseError::Config("learning_rate must be > 0".into()));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(SurpriseError::Config("subsample must be in (0, 1]".into()));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return Err(SurpriseError::Config(
                "colsample_bytree must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration of the model & report stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Merged table to train on.
    pub data_path: PathBuf,
    /// Binary label column; a synthetic label is drawn when it is absent.
    pub label_column: String,
    /// ISO date column.
    pub date_column: String,
    /// Release time column.
    pub time_column: String,
    /// Ordinal importance column (`low`/`medium`/`high`).
    pub importance_column: String,
    /// Numeric features, in order, ahead of the return columns.
    ///
    /// Derived names (`importance_encoded`, `day_of_week`, `month`, `hour`)
    /// are computed; any other name is read as a number. Empty cells count as
    /// 0 and unparseable cells as missing.
    pub base_features: Vec<String>,
    /// Target-encoded categorical features.
    pub categorical_features: Vec<String>,
    /// Held-out fraction of the stratified split.
    pub test_fraction: f64,
    /// Positive rate of the synthetic label.
    pub synthetic_positive_rate: f64,
    /// Seed of the split and of the synthetic label.
    pub seed: u64,
    /// Booster hyperparameters.
    pub params: BoosterParams,
    /// Bars in the importance chart.
    pub top_n: usize,
    /// Text report path.
    pub report_path: PathBuf,
    /// Feature importance chart path.
    pub importance_plot: PathBuf,
    /// ROC curve chart path.
    pub roc_plot: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("build/final_data_merged_1.csv"),
            label_column: "Y_Binary_Surprise".to_string(),
            date_column: "Data".to_string(),
            time_column: "time".to_string(),
            importance_column: "importance".to_string(),
            base_features: vec![
                "previous".to_string(),
                "importance_encoded".to_string(),
                "day_of_week".to_string(),
                "month".to_string(),
                "hour".to_string(),
            ],
            categorical_features: vec![
                "zone".to_string(),
                "currency".to_string(),
                "event".to_string(),
            ],
            test_fraction: 0.2,
            synthetic_positive_rate: 0.05,
            seed: 42,
            params: BoosterParams::default(),
            top_n: 10,
            report_path: PathBuf::from("build/final_model_results.txt"),
            importance_plot: PathBuf::from("build/feature_importance_final.svg"),
            roc_plot: PathBuf::from("build/roc_curve_final.svg"),
        }
    }
}

/// Configuration of the full-data feature importance stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceConfig {
    /// Merged table to train on.
    pub data_path: PathBuf,
    /// Binary label column; a synthetic label is drawn when it is absent.
    pub label_column: String,
    /// Positive rate of the synthetic label.
    pub synthetic_positive_rate: f64,
    /// Seed of the synthetic label.
    pub seed: u64,
    /// Booster hyperparameters.
    pub params: BoosterParams,
    /// Bars in the importance chart.
    pub top_n: usize,
    /// Importance chart path.
    pub plot_path: PathBuf,
    /// Importance table path.
    pub csv_path: PathBuf,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("build/final_data_merged_1.csv"),
            label_column: "target_binary".to_string(),
            synthetic_positive_rate: 0.05,
            seed: 42,
            params: BoosterParams::default(),
            top_n: 20,
            plot_path: PathBuf::from("build/feature_importance_plot.svg"),
            csv_path: PathBuf::from("build/feature_importance_data.csv"),
        }
    }
}
