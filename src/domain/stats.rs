//! Return and dispersion helpers used by the ranker and the metrics.
//!
//! Standard deviations here are sample (n - 1) deviations, matching how
//! daily return volatility is quoted.

/// Simple period-over-period returns: r[i] = p[i+1] / p[i] - 1.
///
/// Returns `None` if any price in the window is missing.
pub fn pct_returns(window: &[Option<f64>]) -> Option<Vec<f64>> {
    let prices: Vec<f64> = window.iter().copied().collect::<Option<Vec<f64>>>()?;
    Some(prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Same as [`pct_returns`] over a dense series.
pub fn pct_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; undefined below two observations.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
