//! Loading of the economic-event ("main") tables.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use surprise_core::{DATE_KEY, Date, DecimalConvention, RawTable, Result, SurpriseError};
use surprise_ingest::clean::parse_price;
use tracing::debug;

/// Header names recognized as the date column, in priority order.
const DATE_HEADERS: &[&str] = &["Data", "data"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y", "%m-%d-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// An event table keyed on [`DATE_KEY`].
#[derive(Debug, Clone)]
pub struct MainTable {
    /// Display name (file name).
    pub name: String,
    /// Event rows; [`DATE_KEY`] is a `Date` column, everything else strings.
    pub frame: DataFrame,
    /// Header of the column used as the date.
    pub date_source: String,
    /// Rows dropped because their date did not parse.
    pub dropped_rows: usize,
}

/// Finds the date column: `Data`, then `data`, then the positional fallback.
pub fn find_date_column(headers: &[String], fallback_index: Option<usize>) -> Option<usize> {
    DATE_HEADERS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
        .or_else(|| fallback_index.filter(|i| *i < headers.len()))
}

/// Parses an event date, month-first for slash dates; time parts are dropped.
pub fn parse_event_date(raw: &str) -> Option<Date> {
    let cell = raw.replace('"', "");
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(cell).ok().map(|dt| dt.date_naive()))
}

/// Reads a column of decimal-comma numbers (`0,5`) with a decimal point.
///
/// Returns `None` unless every non-empty cell is such a number and at least
/// one carries a comma. Cells containing `.` disqualify the column, so
/// point-decimal and text columns are left alone.
pub fn decimal_comma_column<'a>(cells: impl Iterator<Item = &'a str>) -> Option<Vec<Option<String>>> {
    let mut any_comma = false;
    let values = cells
        .map(|cell| {
            let cell = cell.trim();
            if cell.is_empty() {
                return Some(None);
            }
            if cell.contains('.') {
                return None;
            }
            let value = parse_price(cell, DecimalConvention::Comma)?;
            any_comma |= cell.contains(',');
            Some(Some(value.to_string()))
        })
        .collect::<Option<Vec<_>>>()?;
    any_comma.then_some(values)
}

impl MainTable {
    /// Builds a main table from raw rows.
    ///
    /// The date column is renamed to [`DATE_KEY`]; rows whose date does not
    /// parse are dropped. Decimal-comma number columns are rewritten with a
    /// decimal point. Column order is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`SurpriseError::MissingDateColumn`] when no date column can
    /// be identified.
    pub fn from_raw(raw: &RawTable, name: &str, fallback_index: Option<usize>) -> Result<Self> {
        let date_idx = find_date_column(raw.headers(), fallback_index)
            .ok_or_else(|| SurpriseError::MissingDateColumn(name.to_string()))?;

        let date_header = raw.headers()[date_idx].clone();
        let parsed: Vec<Option<Date>> = raw.column(date_idx).map(parse_event_date).collect();
        let keep: Vec<bool> = parsed.iter().map(Option::is_some).collect();
        let dropped_rows = keep.iter().filter(|k| !**k).count();

        let mut frame = raw.to_frame()?;
        for (idx, header) in raw.headers().iter().enumerate() {
            if idx == date_idx {
                continue;
            }
            if let Some(values) = decimal_comma_column(raw.column(idx)) {
                debug!(name, column = %header, "read decimal-comma column");
                frame.with_column(Column::new(header.as_str().into(), values))?;
            }
        }
        frame.drop_in_place(&date_header)?;
        frame.insert_column(date_idx, Column::new(DATE_KEY.into(), parsed))?;
        let frame = frame.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;

        debug!(
            name,
            date_column = %date_header,
            rows = frame.height(),
            dropped_rows,
            "loaded main table"
        );

        Ok(Self {
            name: name.to_string(),
            frame,
            date_source: date_header,
            dropped_rows,
        })
    }

    /// Reads a main table from disk.
    ///
    /// # Errors
    ///
    /// Returns read errors and everything [`Self::from_raw`] rejects.
    pub fn load(path: impl AsRef<Path>, fallback_index: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let raw = RawTable::read(path, true)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_raw(&raw, &name, fallback_index)
    }

    /// Number of event rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_date_column_priority() {
        assert_eq!(find_date_column(&headers(&["x", "data", "Data"]), Some(0)), Some(2));
        assert_eq!(find_date_column(&headers(&["x", "data"]), Some(0)), Some(1));
        assert_eq!(find_date_column(&headers(&["x", "when"]), Some(1)), Some(1));
        assert_eq!(find_date_column(&headers(&["x", "when"]), Some(5)), None);
        assert_eq!(find_date_column(&headers(&["x", "when"]), None), None);
    }

    #[test]
    fn test_parse_event_date() {
        let jan = |d| NaiveDate::from_ymd_opt(2020, 1, d).unwrap();
        assert_eq!(parse_event_date("2020-01-02"), Some(jan(2)));
        assert_eq!(parse_event_date("1/2/2020"), Some(jan(2)));
        assert_eq!(parse_event_date("2020-01-02 08:30:00"), Some(jan(2)));
        assert_eq!(parse_event_date("2020-01-02T08:30:00+00:00"), Some(jan(2)));
        assert_eq!(parse_event_date("02.01.2020"), Some(jan(2)));
        assert_eq!(parse_event_date(""), None);
        assert_eq!(parse_event_date("soon"), None);
    }

    #[test]
    fn test_from_raw_renames_and_drops() {
        let raw = RawTable::parse(
            "id,when,zone\n1,1/2/2020,euro area\n2,garbage,us\n3,1/3/2020,\n",
            true,
        )
        .unwrap();
        let table = MainTable::from_raw(&raw, "events.csv", Some(1)).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.dropped_rows, 1);
        assert_eq!(table.date_source, "when");
        let names: Vec<String> = table
            .frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["id", DATE_KEY, "zone"]);
        assert_eq!(table.frame.column(DATE_KEY).unwrap().dtype(), &DataType::Date);
        assert_eq!(table.frame.column("zone").unwrap().null_count(), 1);
    }

    #[test]
    fn test_decimal_comma_column() {
        let values = decimal_comma_column(["0,5", "", "-1,25", "3"].into_iter()).unwrap();
        assert_eq!(
            values,
            vec![Some("0.5".to_string()), None, Some("-1.25".to_string()), Some("3".to_string())]
        );
        assert!(decimal_comma_column(["0.5", "1,5"].into_iter()).is_none());
        assert!(decimal_comma_column(["1", "2"].into_iter()).is_none());
        assert!(decimal_comma_column(["0,5", "n/a"].into_iter()).is_none());
    }

    #[test]
    fn test_from_raw_reads_decimal_commas() {
        let raw = RawTable::parse(
            "event,Data,previous,actual,zone\nCPI,2020-01-03,\"0,5\",0.3,us\nGDP,2020-01-06,\"1,75\",,euro area\n",
            true,
        )
        .unwrap();
        let table = MainTable::from_raw(&raw, "events.csv", None).unwrap();
        let previous: Vec<Option<&str>> = table
            .frame
            .column("previous")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(previous, vec![Some("0.5"), Some("1.75")]);
        let actual = table.frame.column("actual").unwrap().as_materialized_series().clone();
        assert_eq!(actual.str().unwrap().get(0), Some("0.3"));
    }

    #[test]
    fn test_from_raw_without_date_column() {
        let raw = RawTable::parse("id,zone\n1,us\n", true).unwrap();
        let result = MainTable::from_raw(&raw, "events.csv", None);
        assert!(matches!(result, Err(SurpriseError::MissingDateColumn(_))));
    }
}
