//! Calendar, time-of-day and ordinal features derived from event columns.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Name of the ordinal importance feature.
pub const IMPORTANCE_ENCODED: &str = "importance_encoded";
/// Name of the weekday feature (Monday = 0).
pub const DAY_OF_WEEK: &str = "day_of_week";
/// Name of the month feature (1-12).
pub const MONTH: &str = "month";
/// Name of the release-hour feature.
pub const HOUR: &str = "hour";

/// Features computed here rather than read from a column.
pub const DERIVED_FEATURES: &[&str] = &[IMPORTANCE_ENCODED, DAY_OF_WEEK, MONTH, HOUR];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses the leading ISO date of a cell.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let cell = raw.trim();
    let head = cell.get(..10).unwrap_or(cell);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Weekday with Monday = 0, or 0 for an unparseable date.
pub fn day_of_week(raw: &str) -> f64 {
    parse_iso_date(raw).map_or(0.0, |d| f64::from(d.weekday().num_days_from_monday()))
}

/// Month number, or 0 for an unparseable date.
pub fn month(raw: &str) -> f64 {
    parse_iso_date(raw).map_or(0.0, |d| f64::from(d.month()))
}

/// Hour of a release time (`HH:MM`, `HH:MM:SS`, `h:mm am` or a date-time); 0 when missing.
pub fn hour(raw: &str) -> f64 {
    let cell = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(cell, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
                .map(|dt| dt.time())
        })
        .map_or(0.0, |t| f64::from(t.hour()))
}

/// Maps `low`/`medium`/`high` to 1/2/3, anything else to 0.
pub fn importance_level(raw: &str) -> f64 {
    match raw.trim().to_lowercase().as_str() {
        "low" => 1.0,
        "medium" => 2.0,
        "high" => 3.0,
        _ => 0.0,
    }
}

/// Parses a numeric cell, accepting a lone decimal comma (`0,5`).
///
/// Unparseable cells become NaN and reach the booster as missing values.
pub fn numeric_value(raw: &str) -> f64 {
    let cell = raw.trim();
    cell.parse::<f64>()
        .ok()
        .or_else(|| {
            if cell.contains('.') || cell.matches(',').count() != 1 {
                return None;
            }
            cell.replace(',', ".").parse::<f64>().ok()
        })
        .filter(|v| v.is_finite())
        .unwrap_or(f64::NAN)
}
