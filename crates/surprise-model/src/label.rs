//! Binary label resolution.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Where the training label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// Read from the configured label column.
    Column,
    /// Drawn at random because the label column is absent.
    Synthetic,
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column => write!(f, "column"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Parses label cells; any value that reads as a non-zero number is positive.
pub fn parse_labels<'a>(cells: impl Iterator<Item = &'a str>) -> Vec<u8> {
    cells
        .map(|cell| {
            let value = cell.trim().parse::<f64>().unwrap_or(0.0);
            u8::from(value.is_finite() && value.trunc() != 0.0)
        })
        .collect()
}

/// Draws `n` seeded labels that are positive with probability `positive_rate`.
pub fn synthetic_labels(n: usize, positive_rate: f64, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rate = if positive_rate.is_finite() {
        positive_rate.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (0..n).map(|_| u8::from(rng.gen_bool(rate))).collect()
}

/// Counts of negative and positive labels.
pub fn class_counts(labels: &[u8]) -> (usize, usize) {
    let positives = labels.iter().filter(|y| **y == 1).count();
    (labels.len() - positives, positives)
}

/// `#neg / #pos`, or 1.0 when there are no positives.
pub fn scale_pos_weight(labels: &[u8]) -> f64 {
    match class_counts(labels) {
        (_, 0) => 1.0,
        (neg, pos) => neg as f64 / pos as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_labels() {
        let cells = ["1", "0", "", "1.0", "yes", " 1 "];
        assert_eq!(parse_labels(cells.into_iter()), vec![1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_synthetic_labels_seeded() {
        let a = synthetic_labels(2000, 0.05, 42);
        let b = synthetic_labels(2000, 0.05, 42);
        assert_eq!(a, b);
        let (_, pos) = class_counts(&a);
        assert!(pos > 50 && pos < 160, "positives: {pos}");
    }

    #[test]
    fn test_scale_pos_weight() {
        assert_relative_eq!(scale_pos_weight(&[0, 0, 0, 1]), 3.0);
        assert_relative_eq!(scale_pos_weight(&[0, 0]), 1.0);
    }
}
