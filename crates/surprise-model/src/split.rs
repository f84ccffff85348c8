//! Seeded stratified train/test split.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Training rows, ascending.
    pub train: Vec<usize>,
    /// Held-out rows, ascending.
    pub test: Vec<usize>,
}

/// Splits rows so each class keeps its proportion in both parts.
///
/// Each class contributes `round(n_class * test_fraction)` rows to the test
/// set, at least one when the class has two or more rows and the fraction
/// is positive, and never all of them.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> Split {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in [0u8, 1] {
        let mut rows: Vec<usize> = (0..labels.len()).filter(|i| labels[*i] == class).collect();
        if rows.is_empty() {
            continue;
        }
        rows.shuffle(&mut rng);

        let n = rows.len();
        let mut n_test = (n as f64 * fraction).round() as usize;
        if fraction > 0.0 && n >= 2 {
            n_test = n_test.max(1);
        }
        n_test = n_test.min(n.saturating_sub(1));

        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportions_preserved() {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i % 10 == 0)).collect();
        let split = stratified_split(&labels, 0.2, 42);

        assert_eq!(split.train.len() + split.test.len(), 100);
        assert_eq!(split.test.len(), 20);
        let test_pos = split.test.iter().filter(|i| labels[**i] == 1).count();
        assert_eq!(test_pos, 2);
        assert!(split.train.iter().all(|i| !split.test.contains(i)));
    }

    #[test]
    fn test_deterministic() {
        let labels: Vec<u8> = (0..50).map(|i| u8::from(i % 3 == 0)).collect();
        assert_eq!(stratified_split(&labels, 0.2, 7), stratified_split(&labels, 0.2, 7));
    }

    #[test]
    fn test_rare_class_keeps_a_training_row() {
        let labels = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let split = stratified_split(&labels, 0.2, 42);
        assert_eq!(split.test.iter().filter(|i| labels[**i] == 1).count(), 1);
        assert_eq!(split.train.iter().filter(|i| labels[**i] == 1).count(), 1);

        let single = [0, 0, 0, 1];
        let split = stratified_split(&single, 0.5, 42);
        assert!(split.train.contains(&3));
    }
}
