//! Binary classification metrics.

use std::fmt;

/// Area under the ROC curve from the rank-sum statistic.
///
/// Tied scores share their average rank. `None` when either class is absent.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    let n = labels.len().min(scores.len());
    let positives = labels[..n].iter().filter(|y| **y == 1).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    let mut rank_sum = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tie group [start, end) shares their mean.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        rank_sum += avg_rank * order[start..end].iter().filter(|i| labels[**i] == 1).count() as f64;
        start = end;
    }

    let p = positives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}

/// Points of a ROC curve, ordered by decreasing threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    /// False positive rates.
    pub fpr: Vec<f64>,
    /// True positive rates.
    pub tpr: Vec<f64>,
    /// Score thresholds; the first is `+inf`.
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Builds the curve with one point per distinct score.
    ///
    /// `None` when either class is absent.
    pub fn compute(labels: &[u8], scores: &[f64]) -> Option<Self> {
        let n = labels.len().min(scores.len());
        let positives = labels[..n].iter().filter(|y| **y == 1).count() as f64;
        let negatives = n as f64 - positives;
        if positives == 0.0 || negatives == 0.0 {
            return None;
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

        let mut curve = Self {
            fpr: vec![0.0],
            tpr: vec![0.0],
            thresholds: vec![f64::INFINITY],
        };
        let (mut tp, mut fp) = (0.0, 0.0);
        for (k, &i) in order.iter().enumerate() {
            if labels[i] == 1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            let last_of_group = order.get(k + 1).is_none_or(|next| scores[*next] != scores[i]);
            if last_of_group {
                curve.fpr.push(fp / negatives);
                curve.tpr.push(tp / positives);
                curve.thresholds.push(scores[i]);
            }
        }
        Some(curve)
    }

    /// Trapezoidal area under the curve.
    pub fn auc(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
            .sum()
    }
}

/// Fraction of matching predictions.
pub fn accuracy(labels: &[u8], predicted: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels.iter().zip(predicted).filter(|(y, p)| y == p).count();
    correct as f64 / labels.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Precision, recall, F1 and support of one class.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// True rows of this class.
    pub support: usize,
}

impl ClassMetrics {
    /// Metrics treating `class` as positive; undefined ratios are 0.
    pub fn for_class(labels: &[u8], predicted: &[u8], class: u8) -> Self {
        let mut tp = 0;
        let mut predicted_count = 0;
        let mut support = 0;
        for (y, p) in labels.iter().zip(predicted) {
            if *p == class {
                predicted_count += 1;
            }
            if *y == class {
                support += 1;
                if *p == class {
                    tp += 1;
                }
            }
        }
        let precision = ratio(tp, predicted_count);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Recall of the positive class.
pub fn recall(labels: &[u8], predicted: &[u8]) -> f64 {
    ClassMetrics::for_class(labels, predicted, 1).recall
}

/// Support-weighted mean F1 over both classes.
pub fn f1_weighted(labels: &[u8], predicted: &[u8]) -> f64 {
    ClassificationReport::compute(labels, predicted, ["0", "1"]).weighted_avg.f1
}

/// Per-class table with accuracy, macro and weighted averages.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Display names of classes 0 and 1.
    pub names: [String; 2],
    /// Metrics of classes 0 and 1.
    pub classes: [ClassMetrics; 2],
    /// Overall accuracy.
    pub accuracy: f64,
    /// Unweighted class mean.
    pub macro_avg: ClassMetrics,
    /// Support-weighted class mean.
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Computes the report for classes 0 and 1.
    pub fn compute(labels: &[u8], predicted: &[u8], names: [&str; 2]) -> Self {
        let classes = [
            ClassMetrics::for_class(labels, predicted, 0),
            ClassMetrics::for_class(labels, predicted, 1),
        ];
        let total = classes[0].support + classes[1].support;

        let average = |weight: &dyn Fn(&ClassMetrics) -> f64| {
            let norm: f64 = classes.iter().map(weight).sum();
            let mean = |metric: fn(&ClassMetrics) -> f64| {
                if norm == 0.0 {
                    0.0
                } else {
                    classes.iter().map(|c| metric(c) * weight(c)).sum::<f64>() / norm
                }
            };
            ClassMetrics {
                precision: mean(|c| c.precision),
                recall: mean(|c| c.recall),
                f1: mean(|c| c.f1),
                support: total,
            }
        };

        Self {
            names: names.map(str::to_string),
            classes,
            accuracy: accuracy(labels, predicted),
            macro_avg: average(&|_| 1.0),
            weighted_avg: average(&|c| c.support as f64),
        }
    }

    /// Total rows evaluated.
    pub const fn support(&self) -> usize {
        self.classes[0].support + self.classes[1].support
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .names
            .iter()
            .map(|n| n.chars().count())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in self.names.iter().zip(&self.classes) {
            writeln!(
                f,
                "{name:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{name:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_roc_auc() {
        assert_relative_eq!(roc_auc(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap(), 0.75);
        assert_relative_eq!(roc_auc(&[0, 1], &[0.2, 0.9]).unwrap(), 1.0);
        assert_relative_eq!(roc_auc(&[0, 1], &[0.9, 0.2]).unwrap(), 0.0);
        assert_relative_eq!(roc_auc(&[0, 1, 0, 1], &[0.5; 4]).unwrap(), 0.5);
        assert!(roc_auc(&[1, 1], &[0.1, 0.2]).is_none());
    }

    #[test]
    fn test_roc_curve_matches_rank_auc() {
        let labels = [0, 0, 1, 1, 0, 1, 0, 1, 1, 0];
        let scores = [0.1, 0.4, 0.35, 0.8, 0.4, 0.7, 0.2, 0.4, 0.9, 0.05];
        let curve = RocCurve::compute(&labels, &scores).unwrap();

        assert_eq!(curve.fpr[0], 0.0);
        assert_eq!(curve.tpr[0], 0.0);
        assert_eq!(*curve.fpr.last().unwrap(), 1.0);
        assert_eq!(*curve.tpr.last().unwrap(), 1.0);
        assert!(curve.fpr.windows(2).all(|w| w[0] <= w[1]));
        assert!(curve.tpr.windows(2).all(|w| w[0] <= w[1]));
        assert_relative_eq!(curve.auc(), roc_auc(&labels, &scores).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_accuracy_recall_f1() {
        let labels = [0, 0, 0, 1, 1];
        let predicted = [0, 0, 1, 1, 0];
        assert_relative_eq!(accuracy(&labels, &predicted), 0.6);
        assert_relative_eq!(recall(&labels, &predicted), 0.5);

        let f1_zero = 2.0 * (2.0 / 3.0) * (2.0 / 3.0) / (4.0 / 3.0);
        let f1_one = 0.5;
        assert_relative_eq!(
            f1_weighted(&labels, &predicted),
            (3.0 * f1_zero + 2.0 * f1_one) / 5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_report_covers_both_classes() {
        let labels = [0, 0, 0, 0, 1];
        let predicted = [0, 0, 0, 0, 0];
        let report = ClassificationReport::compute(&labels, &predicted, ["negative", "positive"]);

        assert_eq!(report.classes[0].support, 4);
        assert_eq!(report.classes[1].support, 1);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert_relative_eq!(report.macro_avg.recall, 0.5);
        assert_relative_eq!(report.weighted_avg.recall, 0.8);

        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("negative"));
        assert!(text.contains("positive"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("0.80"));
    }
}
