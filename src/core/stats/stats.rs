// ============================================================================
// Location
// ============================================================================

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

// ============================================================================
// Dispersion
// ============================================================================

/// Sample variance (divisor n - 1). NaN when fewer than two values.
pub fn sample_variance(x: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(x);
    x.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Sample standard deviation (divisor n - 1). NaN when fewer than two values.
pub fn sample_std(x: &[f64]) -> f64 {
    sample_variance(x).sqrt()
}

// ============================================================================
// Risk-adjusted return
// ============================================================================

/// Mean over standard deviation, scaled by `sqrt(periods_per_year)`.
///
/// Undefined (NaN) when the deviation is zero or cannot be computed.
pub fn annualized_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let sd = sample_std(returns);
    if !(sd.is_finite() && sd > 0.0) {
        return f64::NAN;
    }
    mean(returns) / sd * periods_per_year.sqrt()
}

/// Running `exp(cumsum)` of log returns.
pub fn cumulative_log_growth(log_returns: &[f64]) -> Vec<f64> {
    log_returns
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r;
            Some(acc.exp())
        })
        .collect()
}
