//! Lagged return computation.

/// Simple day-over-day change, `p[i] / p[i-1] - 1`; the first entry is `None`.
///
/// A change that is not finite (a zero previous price) is `None`.
pub fn pct_change(prices: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(prices.windows(2).map(|w| {
        let change = w[1] / w[0] - 1.0;
        change.is_finite().then_some(change)
    }));
    out
}

/// Shifts a series forward by `periods`, filling the head with `None`.
pub fn shift<T: Copy>(values: &[Option<T>], periods: usize) -> Vec<Option<T>> {
    let n = values.len();
    let lead = periods.min(n);
    std::iter::repeat_n(None, lead)
        .chain(values[..n - lead].iter().copied())
        .collect()
}

/// Previous-day return for every row of an ascending price series.
///
/// Row `i` holds `p[i-1] / p[i-2] - 1`, so the first two rows are `None`.
pub fn lagged_returns(prices: &[f64]) -> Vec<Option<f64>> {
    shift(&pct_change(prices), 1)
}
