//! Smoothed target encoding of categorical columns.
//!
//! Each category is replaced by a blend of its positive rate and the global
//! prior, weighted by a sigmoid of the category's row count:
//!
//! ```text
//! weight  = 1 / (1 + exp(-(count - min_samples_leaf) / smoothing))
//! encoded = prior * (1 - weight) + mean * weight
//! ```
//!
//! Categories seen once, or never seen during fitting, encode to the prior.

use std::collections::HashMap;
use surprise_core::{Result, SurpriseError};

/// Fitted encoding of one categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEncoding {
    /// Column name.
    pub name: String,
    mapping: HashMap<String, f64>,
}

impl ColumnEncoding {
    /// Encoded value of a category, or `prior` for an unseen one.
    pub fn encode(&self, category: &str, prior: f64) -> f64 {
        self.mapping.get(category).copied().unwrap_or(prior)
    }

    /// Number of categories seen during fitting.
    pub fn categories(&self) -> usize {
        self.mapping.len()
    }
}

/// Target encoder over several categorical columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEncoder {
    smoothing: f64,
    min_samples_leaf: usize,
    prior: f64,
    columns: Vec<ColumnEncoding>,
}

impl Default for TargetEncoder {
    fn default() -> Self {
        Self::new(1.0, 20)
    }
}

impl TargetEncoder {
    /// Creates an unfitted encoder.
    pub const fn new(smoothing: f64, min_samples_leaf: usize) -> Self {
        Self {
            smoothing,
            min_samples_leaf,
            prior: 0.0,
            columns: Vec::new(),
        }
    }

    /// Learns per-category statistics from `columns` against `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::InvalidData`] if a column's length differs
    /// from the label count, and [`SurpriseError::InsufficientData`] when
    /// there are no labels.
    pub fn fit(&mut self, columns: &[(String, Vec<String>)], labels: &[u8]) -> Result<()> {
        if labels.is_empty() {
            return Err(SurpriseError::InsufficientData(
                "cannot fit a target encoder without labels".into(),
            ));
        }
        self.prior = labels.iter().map(|y| f64::from(*y)).sum::<f64>() / labels.len() as f64;

        self.columns = columns
            .iter()
            .map(|(name, values)| {
                if values.len() != labels.len() {
                    return Err(SurpriseError::InvalidData(format!(
                        "column {name} has {} values for {} labels",
                        values.len(),
                        labels.len()
                    )));
                }
                let mut stats: HashMap<&str, (usize, f64)> = HashMap::new();
                for (value, y) in values.iter().zip(labels) {
                    let entry = stats.entry(value.as_str()).or_insert((0, 0.0));
                    entry.0 += 1;
                    entry.1 += f64::from(*y);
                }
                let mapping = stats
                    .into_iter()
                    .map(|(category, (count, sum))| {
                        (category.to_string(), self.blend(count, sum / count as f64))
                    })
                    .collect();
                Ok(ColumnEncoding {
                    name: name.clone(),
                    mapping,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    fn blend(&self, count: usize, mean: f64) -> f64 {
        if count <= 1 {
            return self.prior;
        }
        let exponent = -(count as f64 - self.min_samples_leaf as f64) / self.smoothing;
        let weight = 1.0 / (1.0 + exponent.exp());
        self.prior * (1.0 - weight) + mean * weight
    }

    /// Encodes one categorical column by name.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::MissingColumn`] if the column was not fitted.
    pub fn transform(&self, name: &str, values: &[String]) -> Result<Vec<f64>> {
        let encoding = self
            .columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SurpriseError::MissingColumn(name.to_string()))?;
        Ok(values.iter().map(|v| encoding.encode(v, self.prior)).collect())
    }

    /// Mean label seen during fitting.
    pub const fn prior(&self) -> f64 {
        self.prior
    }

    /// Fitted column encodings.
    pub fn columns(&self) -> &[ColumnEncoding] {
        &self.columns
    }
}
