//! Merged-table loading and feature matrix assembly.

use crate::encoding::TargetEncoder;
use crate::features::{
    DAY_OF_WEEK, HOUR, IMPORTANCE_ENCODED, MONTH, day_of_week, hour, importance_level, month,
    numeric_value,
};
use crate::label::{LabelSource, parse_labels, synthetic_labels};
use ndarray::Array2;
use std::path::Path;
use surprise_core::{ModelConfig, RETURN_PREFIX, RawTable, Result, SurpriseError};
use tracing::{debug, warn};

/// A merged event table with every cell as text; empty cells read as `0`.
#[derive(Debug, Clone)]
pub struct EventTable {
    raw: RawTable,
}

impl EventTable {
    /// Reads a merged CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::FileNotFound`] or a read error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_raw(RawTable::read(path, true)?))
    }

    /// Wraps raw rows.
    pub const fn from_raw(raw: RawTable) -> Self {
        Self { raw }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Column names.
    pub fn headers(&self) -> &[String] {
        self.raw.headers()
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.raw.position(name).is_some()
    }

    fn cells(&self, name: &str) -> Result<impl Iterator<Item = &str> + '_> {
        let idx = self
            .raw
            .position(name)
            .ok_or_else(|| SurpriseError::MissingColumn(name.to_string()))?;
        Ok(self.raw.column(idx).map(|cell| {
            let cell = cell.trim();
            if cell.is_empty() { "0" } else { cell }
        }))
    }

    /// A column coerced to numbers; empty cells read as 0, unparseable
    /// ones as NaN.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::MissingColumn`].
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.cells(name)?.map(numeric_value).collect())
    }

    /// A column as text.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::MissingColumn`].
    pub fn text(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.cells(name)?.map(str::to_string).collect())
    }

    /// Whether every non-empty cell of a column parses as a number.
    pub fn is_numeric(&self, name: &str) -> bool {
        self.raw.position(name).is_some_and(|idx| {
            self.raw
                .column(idx)
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .all(|cell| !numeric_value(cell).is_nan())
        })
    }

    /// Lagged-return columns in header order.
    pub fn return_columns(&self) -> Vec<String> {
        self.headers()
            .iter()
            .filter(|h| h.starts_with(RETURN_PREFIX))
            .cloned()
            .collect()
    }

    /// Labels from `column`, or seeded synthetic labels when it is absent.
    pub fn labels(&self, column: &str, positive_rate: f64, seed: u64) -> (Vec<u8>, LabelSource) {
        match self.cells(column) {
            Ok(cells) => (parse_labels(cells), LabelSource::Column),
            Err(_) => {
                warn!(column, positive_rate, "label column absent, drawing a synthetic label");
                (
                    synthetic_labels(self.height(), positive_rate, seed),
                    LabelSource::Synthetic,
                )
            }
        }
    }
}

/// Model inputs before categorical encoding.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    numeric_names: Vec<String>,
    numeric: Vec<Vec<f64>>,
    categorical: Vec<(String, Vec<String>)>,
}

impl FeatureSet {
    /// Derives base features, appends every return column and collects
    /// the categorical columns.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::MissingColumn`] for an absent feature
    /// column. A missing time column yields hour 0.
    pub fn build(table: &EventTable, config: &ModelConfig) -> Result<Self> {
        let mut numeric_names = Vec::new();
        let mut numeric = Vec::new();

        for name in &config.base_features {
            let values: Vec<f64> = match name.as_str() {
                IMPORTANCE_ENCODED => table
                    .cells(&config.importance_column)?
                    .map(importance_level)
                    .collect(),
                DAY_OF_WEEK => table.cells(&config.date_column)?.map(day_of_week).collect(),
                MONTH => table.cells(&config.date_column)?.map(month).collect(),
                HOUR => match table.cells(&config.time_column) {
                    Ok(cells) => cells.map(hour).collect(),
                    Err(_) => vec![0.0; table.height()],
                },
                column => table.numeric(column)?,
            };
            numeric_names.push(name.clone());
            numeric.push(values);
        }

        for column in table.return_columns() {
            if numeric_names.contains(&column) {
                continue;
            }
            numeric.push(table.numeric(&column)?);
            numeric_names.push(column);
        }

        let categorical = config
            .categorical_features
            .iter()
            .map(|name| Ok((name.clone(), table.text(name)?)))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            numeric = numeric_names.len(),
            categorical = categorical.len(),
            "built feature set"
        );
        Ok(Self {
            numeric_names,
            numeric,
            categorical,
        })
    }

    /// Numeric-only feature set over the given columns.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::MissingColumn`] for an absent column.
    pub fn numeric_only(table: &EventTable, columns: &[String]) -> Result<Self> {
        let numeric = columns
            .iter()
            .map(|c| table.numeric(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            numeric_names: columns.to_vec(),
            numeric,
            categorical: Vec::new(),
        })
    }

    /// Feature names in matrix column order: numeric, then categorical.
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric_names
            .iter()
            .cloned()
            .chain(self.categorical.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// Categorical columns restricted to `rows`.
    pub fn categorical_rows(&self, rows: &[usize]) -> Vec<(String, Vec<String>)> {
        self.categorical
            .iter()
            .map(|(name, values)| (name.clone(), rows.iter().map(|r| values[*r].clone()).collect()))
            .collect()
    }

    /// Feature matrix for `rows`, categoricals encoded with `encoder`.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::MissingColumn`] if the encoder was not fitted
    /// on a categorical column.
    pub fn matrix(&self, rows: &[usize], encoder: &TargetEncoder) -> Result<Array2<f64>> {
        let mut columns: Vec<Vec<f64>> = self
            .numeric
            .iter()
            .map(|values| rows.iter().map(|r| values[*r]).collect())
            .collect();
        for (name, values) in self.categorical_rows(rows) {
            columns.push(encoder.transform(&name, &values)?);
        }

        Ok(Array2::from_shape_fn((rows.len(), columns.len()), |(i, j)| {
            columns[j][i]
        }))
    }
}

/// Columns usable by the full-data importance model.
///
/// Keeps columns whose cells are all numeric, dropping the label and any
/// column whose name contains `Data` or `Unnamed`.
pub fn numeric_feature_columns(table: &EventTable, label_column: &str) -> Vec<String> {
    table
        .headers()
        .iter()
        .filter(|name| name.as_str() != label_column)
        .filter(|name| !name.contains("Data") && !name.contains("Unnamed"))
        .filter(|name| table.is_numeric(name))
        .cloned()
        .collect()
}
