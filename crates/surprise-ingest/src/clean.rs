//! Cell-level cleaning of dates and prices.
//!
//! Exported price histories quote every cell, use day-first dates and write
//! numbers with a decimal comma. These helpers turn one raw cell into a typed
//! value or `None`; rows with a `None` are dropped by the caller.

use chrono::{NaiveDate, NaiveDateTime};
use surprise_core::config::DecimalConvention;

/// Day-first formats tried after the explicit source format.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%y", "%d/%m/%y", "%d-%m-%y", "%Y-%m-%d",
    "%Y/%m/%d", "%Y.%m.%d", "%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y",
];

/// Date-time formats whose date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Strips quote characters and surrounding whitespace.
pub fn clean_cell(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

/// Parses a trading date.
///
/// Tries `format` first, then the day-first fallbacks, then date-times whose
/// time part is discarded, then the first whitespace-separated token.
pub fn parse_trade_date(raw: &str, format: &str) -> Option<NaiveDate> {
    let cell = clean_cell(raw);
    if cell.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(&cell, format) {
        return Some(date);
    }
    parse_day_first(&cell)
}

fn parse_day_first(cell: &str) -> Option<NaiveDate> {
    DAY_FIRST_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            let token = cell.split_whitespace().next()?;
            if token.len() == cell.len() {
                return None;
            }
            DAY_FIRST_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
        })
}

/// Parses a price under a decimal convention.
///
/// A plain number whose only separator is the decimal mark is read directly.
/// Anything else has its thousands separators removed and its decimal mark
/// turned into a point before a second attempt. Non-finite results are
/// rejected.
pub fn parse_price(raw: &str, convention: DecimalConvention) -> Option<f64> {
    let cell = clean_cell(raw);
    if cell.is_empty() {
        return None;
    }
    let mark = convention.decimal_mark();
    let thousands = convention.thousands_separator();

    let value = if !cell.contains(thousands) {
        cell.replace(mark, ".").parse::<f64>().ok()
    } else {
        None
    };

    let value = value.or_else(|| {
        let normalized: String = cell
            .chars()
            .filter(|c| *c != thousands && !c.is_whitespace())
            .map(|c| if c == mark { '.' } else { c })
            .collect();
        normalized.parse::<f64>().ok()
    })?;

    value.is_finite().then_some(value)
}
