//! Explicit record of rows dropped during cleaning.
//!
//! Every row removed because its date or price failed to parse is recorded
//! here, so callers can assert on exact drop counts instead of inferring them
//! from final row counts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which cell of a row caused it to be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// The date cell did not parse to a calendar date.
    Date,
    /// The price cell did not parse to a finite number.
    Price,
    /// The row repeated a date already kept.
    DuplicateDate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Price => write!(f, "price"),
            Self::DuplicateDate => write!(f, "duplicate date"),
        }
    }
}

/// A single dropped row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    /// Field that failed.
    pub field: Field,
    /// Raw cell content as read.
    pub raw: String,
}

/// Rejections collected while cleaning one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionLog {
    source: String,
    entries: Vec<Rejection>,
}

impl RejectionLog {
    /// Creates an empty log for a source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    /// Records a dropped row.
    pub fn reject(&mut self, row: usize, field: Field, raw: impl Into<String>) {
        self.entries.push(Rejection {
            row,
            field,
            raw: raw.into(),
        });
    }

    /// Source the log belongs to.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All recorded rejections in the order they happened.
    pub fn entries(&self) -> &[Rejection] {
        &self.entries
    }

    /// Total number of dropped rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was dropped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows dropped for a given field.
    pub fn count(&self, field: Field) -> usize {
        self.entries.iter().filter(|r| r.field == field).count()
    }
}

impl fmt::Display for RejectionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} rows dropped ({} date, {} price, {} duplicate)",
            self.source,
            self.len(),
            self.count(Field::Date),
            self.count(Field::Price),
            self.count(Field::DuplicateDate)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_field() {
        let mut log = RejectionLog::new("gold.csv");
        log.reject(1, Field::Date, "31.02.2020");
        log.reject(4, Field::Price, "-");
        log.reject(7, Field::Price, "n/a");

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(Field::Date), 1);
        assert_eq!(log.count(Field::Price), 2);
        assert_eq!(log.count(Field::DuplicateDate), 0);
        assert_eq!(log.entries()[1].row, 4);
    }

    #[test]
    fn test_display() {
        let mut log = RejectionLog::new("gold.csv");
        log.reject(2, Field::Date, "x");
        assert_eq!(
            log.to_string(),
            "gold.csv: 1 rows dropped (1 date, 0 price, 0 duplicate)"
        );
    }

    #[test]
    fn test_empty_log() {
        let log = RejectionLog::new("empty.csv");
        assert!(log.is_empty());
        assert_eq!(log.source(), "empty.csv");
    }
}
