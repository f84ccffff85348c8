//! Feature-importance bar chart and ROC curve.

use crate::svg::{Anchor, Canvas, viridis};
use surprise_model::{FeatureImportance, RocCurve};

const WIDTH: f64 = 960.0;
const BAR_HEIGHT: f64 = 28.0;
const LEFT: f64 = 300.0;
const RIGHT: f64 = 60.0;
const TOP: f64 = 70.0;
const BOTTOM: f64 = 70.0;

/// Rounds `max` up to a 1-2-5 step axis; returns (axis max, step).
fn nice_axis(max: f64) -> (f64, f64) {
    if max <= 0.0 || !max.is_finite() {
        return (1.0, 0.2);
    }
    let raw_step = max / 5.0;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw_step)
        .unwrap_or(10.0 * magnitude);
    ((max / step).ceil() * step, step)
}

/// Horizontal bars of the `top_n` most important features, largest on top.
pub fn importance_chart(
    importances: &[FeatureImportance],
    top_n: usize,
    title: &str,
    x_label: &str,
) -> String {
    let shown = &importances[..top_n.min(importances.len())];
    let plot_height = BAR_HEIGHT * shown.len().max(1) as f64;
    let height = TOP + plot_height + BOTTOM;
    let plot_width = WIDTH - LEFT - RIGHT;

    let mut canvas = Canvas::new(WIDTH, height);
    canvas.title(WIDTH / 2.0, 36.0, 20.0, title);

    let max = shown.iter().map(|f| f.importance).max().unwrap_or(0) as f64;
    let (axis_max, step) = nice_axis(max);
    let x_of = |v: f64| LEFT + v / axis_max * plot_width;

    let n_ticks = (axis_max / step).round() as usize;
    for k in 0..=n_ticks {
        let tick = k as f64 * step;
        let label = if step >= 1.0 {
            format!("{tick:.0}")
        } else {
            format!("{tick:.1}")
        };
        let x = x_of(tick);
        canvas.line((x, TOP), (x, TOP + plot_height), "#e0e0e0", 1.0, None);
        canvas.text(x, TOP + plot_height + 18.0, 12.0, Anchor::Middle, &label);
    }

    for (i, feature) in shown.iter().enumerate() {
        let y = TOP + i as f64 * BAR_HEIGHT;
        let shade = if shown.len() > 1 {
            i as f64 / (shown.len() - 1) as f64
        } else {
            0.0
        };
        let value = feature.importance as f64;
        canvas.rect(LEFT, y + 4.0, x_of(value) - LEFT, BAR_HEIGHT - 8.0, &viridis(shade));
        canvas.text(LEFT - 8.0, y + BAR_HEIGHT / 2.0 + 4.0, 13.0, Anchor::End, &feature.feature);
        canvas.text(
            x_of(value) + 6.0,
            y + BAR_HEIGHT / 2.0 + 4.0,
            11.0,
            Anchor::Start,
            &feature.importance.to_string(),
        );
    }

    canvas.line((LEFT, TOP), (LEFT, TOP + plot_height), "#333333", 1.0, None);
    canvas.line(
        (LEFT, TOP + plot_height),
        (LEFT + plot_width, TOP + plot_height),
        "#333333",
        1.0,
        None,
    );
    canvas.text(LEFT + plot_width / 2.0, height - 24.0, 14.0, Anchor::Middle, x_label);
    canvas.vertical_text(24.0, TOP + plot_height / 2.0, 14.0, "Feature");
    canvas.finish()
}

/// ROC curve with the chance diagonal and the AUC in the legend.
pub fn roc_chart(curve: &RocCurve, auc: f64) -> String {
    const W: f64 = 800.0;
    const H: f64 = 600.0;
    const MARGIN: f64 = 70.0;
    const Y_MAX: f64 = 1.05;
    let plot_w = W - 2.0 * MARGIN;
    let plot_h = H - 2.0 * MARGIN;
    let point = |fpr: f64, tpr: f64| (MARGIN + fpr * plot_w, H - MARGIN - tpr / Y_MAX * plot_h);

    let mut canvas = Canvas::new(W, H);
    canvas.title(W / 2.0, 40.0, 20.0, "ROC Curve");

    for k in 0..=5 {
        let v = f64::from(k) * 0.2;
        let (x, y_bottom) = point(v, 0.0);
        let (x_left, y) = point(0.0, v);
        canvas.line((x, MARGIN), (x, y_bottom), "#eeeeee", 1.0, None);
        canvas.line((x_left, y), (W - MARGIN, y), "#eeeeee", 1.0, None);
        canvas.text(x, y_bottom + 18.0, 12.0, Anchor::Middle, &format!("{v:.1}"));
        canvas.text(x_left - 8.0, y + 4.0, 12.0, Anchor::End, &format!("{v:.1}"));
    }

    canvas.line(point(0.0, 0.0), point(1.0, 1.0), "navy", 2.0, Some("6 4"));
    let points: Vec<(f64, f64)> = curve
        .fpr
        .iter()
        .zip(&curve.tpr)
        .map(|(f, t)| point(*f, *t))
        .collect();
    canvas.polyline(&points, "darkorange", 2.0);

    canvas.line((MARGIN, MARGIN), (MARGIN, H - MARGIN), "#333333", 1.0, None);
    canvas.line((MARGIN, H - MARGIN), (W - MARGIN, H - MARGIN), "#333333", 1.0, None);
    canvas.text(W / 2.0, H - 24.0, 14.0, Anchor::Middle, "False Positive Rate");
    canvas.vertical_text(22.0, H / 2.0, 14.0, "True Positive Rate");

    let legend_x = W - MARGIN - 250.0;
    let legend_y = H - MARGIN - 40.0;
    canvas.rect(legend_x, legend_y, 240.0, 30.0, "#f8f8f8");
    canvas.line(
        (legend_x + 10.0, legend_y + 15.0),
        (legend_x + 40.0, legend_y + 15.0),
        "darkorange",
        2.0,
        None,
    );
    canvas.text(
        legend_x + 48.0,
        legend_y + 20.0,
        13.0,
        Anchor::Start,
        &format!("ROC curve (AUC = {auc:.4})"),
    );
    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importances(values: &[(&str, usize)]) -> Vec<FeatureImportance> {
        values
            .iter()
            .map(|(feature, importance)| FeatureImportance {
                feature: feature.to_string(),
                importance: *importance,
            })
            .collect()
    }

    #[test]
    fn test_nice_axis() {
        assert_eq!(nice_axis(0.0), (1.0, 0.2));
        let (max, step) = nice_axis(137.0);
        assert_eq!(step, 50.0);
        assert_eq!(max, 150.0);
    }

    #[test]
    fn test_importance_chart_limits_bars() {
        let data = importances(&[("previous", 90), ("hour", 40), ("zone", 10)]);
        let svg = importance_chart(&data, 2, "Feature Importance", "Split count");
        assert!(svg.contains(">previous<"));
        assert!(svg.contains(">hour<"));
        assert!(!svg.contains(">zone<"));
        assert!(svg.contains("Feature Importance"));
    }

    #[test]
    fn test_importance_chart_empty() {
        let svg = importance_chart(&[], 10, "Empty", "Split count");
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_roc_chart_annotates_auc() {
        let curve = RocCurve {
            fpr: vec![0.0, 0.0, 0.5, 1.0],
            tpr: vec![0.0, 0.5, 1.0, 1.0],
            thresholds: vec![f64::INFINITY, 0.9, 0.5, 0.1],
        };
        let svg = roc_chart(&curve, curve.auc());
        assert!(svg.contains("ROC curve (AUC = 0.8750)"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains(r#"stroke="navy""#));
    }
}
