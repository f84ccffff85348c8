//! Left join of return tables onto a main table.

use polars::prelude::*;
use surprise_core::{DATE_KEY, Result, ReturnTable, SurpriseError};
use tracing::{debug, warn};

const ROW_ORDER: &str = "__row_order";

/// A return table left out of a merge.
#[derive(Debug, Clone)]
pub struct SkippedTable {
    /// Column the table would have added.
    pub column: String,
    /// Reason it was skipped.
    pub reason: String,
}

/// Result of joining return tables onto one main table.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// The merged frame, row-aligned with the main table.
    pub frame: DataFrame,
    /// Return columns added, in join order.
    pub added_columns: Vec<String>,
    /// Tables rejected before joining.
    pub skipped: Vec<SkippedTable>,
}

/// Checks that a return table can act as the right side of a left join.
///
/// # Errors
///
/// Returns [`SurpriseError::DuplicateKeys`] if any date appears twice.
pub fn ensure_unique_dates(table: &ReturnTable) -> Result<()> {
    match table.duplicate_dates() {
        0 => Ok(()),
        count => Err(SurpriseError::DuplicateKeys {
            table: table.asset().to_string(),
            count,
        }),
    }
}

/// Left-joins every return table onto `main` on [`DATE_KEY`].
///
/// Tables with duplicate dates, or whose column already exists in the
/// frame, are skipped with a warning. The output keeps every main row in
/// its original order; dates without a return become null.
pub fn merge_returns(main: &DataFrame, tables: &[ReturnTable]) -> Result<JoinOutcome> {
    if main.column(DATE_KEY).is_err() {
        return Err(SurpriseError::MissingColumn(DATE_KEY.to_string()));
    }

    let mut merged = main.with_row_index(ROW_ORDER.into(), None)?;
    let mut added_columns = Vec::new();
    let mut skipped = Vec::new();

    for table in tables {
        let column = table.column_name();
        if let Err(e) = ensure_unique_dates(table) {
            warn!(%column, error = %e, "skipping return table");
            skipped.push(SkippedTable { column, reason: e.to_string() });
            continue;
        }
        if merged.column(&column).is_ok() {
            warn!(%column, "column already present, skipping return table");
            skipped.push(SkippedTable {
                column,
                reason: "column already present".to_string(),
            });
            continue;
        }

        let right = table.to_frame()?;
        merged = merged
            .lazy()
            .join(
                right.lazy(),
                [col(DATE_KEY)],
                [col(DATE_KEY)],
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;
        debug!(%column, rows = merged.height(), "joined return table");
        added_columns.push(column);
    }

    let frame = merged
        .sort([ROW_ORDER], SortMultipleOptions::default())?
        .drop(ROW_ORDER)?;

    Ok(JoinOutcome { frame, added_columns, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use surprise_core::Date;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn main_frame(days: &[u32]) -> DataFrame {
        let dates: Vec<Date> = days.iter().map(|day| d(*day)).collect();
        let ids: Vec<String> = (0..days.len()).map(|i| format!("e{i}")).collect();
        DataFrame::new(vec![
            Column::new("id".into(), ids),
            Column::new(DATE_KEY.into(), dates),
        ])
        .unwrap()
    }

    fn returns(asset: &str, days: &[u32], values: &[Option<f64>]) -> ReturnTable {
        let dates = days.iter().map(|day| d(*day)).collect();
        ReturnTable::new(asset, dates, values.to_vec()).unwrap()
    }

    #[test]
    fn test_preserves_rows_and_order() {
        let main = main_frame(&[5, 2, 9, 2]);
        let table = returns("ibov", &[2, 5], &[Some(0.01), Some(-0.02)]);
        let out = merge_returns(&main, &[table]).unwrap();

        assert_eq!(out.frame.height(), 4);
        assert_eq!(out.added_columns, vec!["lagged_return_ibov"]);
        let ids: Vec<&str> = out
            .frame
            .column("id")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(ids, vec!["e0", "e1", "e2", "e3"]);

        let values: Vec<Option<f64>> = out
            .frame
            .column("lagged_return_ibov")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_relative_eq!(values[0].unwrap(), -0.02);
        assert_relative_eq!(values[1].unwrap(), 0.01);
        assert_eq!(values[2], None);
        assert_relative_eq!(values[3].unwrap(), 0.01);
        assert!(out.frame.column(ROW_ORDER).is_err());
    }

    #[test]
    fn test_duplicate_table_skipped() {
        let main = main_frame(&[1, 2]);
        let dup = returns("dup", &[1, 1], &[Some(0.1), Some(0.2)]);
        let ok = returns("ok", &[2], &[Some(0.3)]);
        let out = merge_returns(&main, &[dup, ok]).unwrap();

        assert_eq!(out.frame.height(), 2);
        assert_eq!(out.added_columns, vec!["lagged_return_ok"]);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].column, "lagged_return_dup");
        assert!(out.frame.column("lagged_return_dup").is_err());
    }

    #[test]
    fn test_repeated_asset_skipped() {
        let main = main_frame(&[1]);
        let a = returns("gold", &[1], &[Some(0.1)]);
        let out = merge_returns(&main, &[a.clone(), a]).unwrap();
        assert_eq!(out.added_columns.len(), 1);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.frame.width(), 3);
    }

    #[test]
    fn test_missing_date_key() {
        let main = DataFrame::new(vec![Column::new("id".into(), ["a"])]).unwrap();
        assert!(matches!(
            merge_returns(&main, &[]),
            Err(SurpriseError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_no_tables_is_identity() {
        let main = main_frame(&[3, 1]);
        let out = merge_returns(&main, &[]).unwrap();
        assert!(out.frame.equals(&main));
    }
}
