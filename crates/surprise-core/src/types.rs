//! Common types shared by the pipeline stages.

use crate::{DATE_KEY, RETURN_PREFIX, Result, SurpriseError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Lagged daily returns of a single asset.
///
/// Produced by the ingest stage and consumed by the merge stage. Row `i`
/// holds the return of the *previous* trading day, so a model keyed on the
/// same date never sees same-day price information.
///
/// # Expected Shape
///
/// - `dates` ascending, one entry per trading day kept after cleaning
/// - `returns` aligned with `dates`; `None` where no lagged return exists
///   (the first two rows of every series)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    asset: String,
    dates: Vec<Date>,
    returns: Vec<Option<f64>>,
}

impl ReturnTable {
    /// Creates a table from aligned date and return vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::InvalidData`] if the vectors differ in length
    /// or the asset name is empty.
    pub fn new(
        asset: impl Into<String>,
        dates: Vec<Date>,
        returns: Vec<Option<f64>>,
    ) -> Result<Self> {
        let asset = asset.into();
        if asset.is_empty() {
            return Err(SurpriseError::InvalidData(
                "asset name must not be empty".to_string(),
            ));
        }
        if dates.len() != returns.len() {
            return Err(SurpriseError::InvalidData(format!(
                "{asset}: {} dates but {} returns",
                dates.len(),
                returns.len()
            )));
        }
        Ok(Self {
            asset,
            dates,
            returns,
        })
    }

    /// Asset name derived from the source file.
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Name of the return column this table contributes to a merge.
    pub fn column_name(&self) -> String {
        format!("{RETURN_PREFIX}{}", self.asset)
    }

    /// Trading dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Lagged returns aligned with [`Self::dates`].
    pub fn returns(&self) -> &[Option<f64>] {
        &self.returns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of rows whose date repeats an earlier row.
    pub fn duplicate_dates(&self) -> usize {
        let mut sorted = self.dates.clone();
        sorted.sort_unstable();
        sorted.windows(2).filter(|w| w[0] == w[1]).count()
    }

    /// Converts the table into a two-column frame keyed on [`DATE_KEY`].
    ///
    /// # Errors
    ///
    /// Propagates Polars construction errors.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = DataFrame::new(vec![
            Column::new(DATE_KEY.into(), self.dates.as_slice()),
            Column::new(self.column_name().into(), self.returns.as_slice()),
        ])?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2020, 1, day).unwrap()
    }

    #[test]
    fn test_return_table_new() {
        let table = ReturnTable::new("Ibovespa", vec![d(1), d(2)], vec![None, None]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.asset(), "Ibovespa");
        assert_eq!(table.column_name(), "lagged_return_Ibovespa");
    }

    #[test]
    fn test_return_table_length_mismatch() {
        let result = ReturnTable::new("Gold", vec![d(1)], vec![]);
        assert!(matches!(result, Err(SurpriseError::InvalidData(_))));
    }

    #[test]
    fn test_return_table_empty_asset() {
        let result = ReturnTable::new("", vec![], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_dates() {
        let table = ReturnTable::new(
            "Gold",
            vec![d(1), d(2), d(2), d(3), d(2)],
            vec![None; 5],
        )
        .unwrap();
        assert_eq!(table.duplicate_dates(), 2);
    }

    #[test]
    fn test_to_frame() {
        let table =
            ReturnTable::new("Gold", vec![d(1), d(2), d(3)], vec![None, None, Some(0.1)]).unwrap();
        let df = table.to_frame().unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 2);
        assert_eq!(
            df.column(DATE_KEY).unwrap().dtype(),
            &DataType::Date
        );
        let returns = df
            .column("lagged_return_Gold")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(returns.null_count(), 2);
        assert_eq!(returns.get(2), Some(0.1));
    }

    #[test]
    fn test_serde_round_trip_keeps_missing() {
        let table = ReturnTable::new("Gold", vec![d(1), d(2)], vec![None, Some(0.5)]).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        let back: ReturnTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
