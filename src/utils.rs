//! Shared numeric helpers: log-sum-exp and weighted moments.
//!
//! These are the small building blocks the E-step and the family M-steps
//! lean on. All helpers are allocation-free and operate on `ndarray` views.
use ndarray::ArrayView1;

/// Numerically stable `ln Σ exp(x_k)` over one row of log-terms.
///
/// Subtracts the row maximum before exponentiating so that at least one term
/// has magnitude 1, then adds it back. Rows whose maximum is `-inf` (every
/// term impossible) return `-inf`; callers treat that as the degenerate-row
/// signal rather than dividing by a zero sum.
pub fn log_sum_exp(row: ArrayView1<f64>) -> f64 {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = row.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Responsibility-weighted mean of one column.
///
/// `total` is the weight sum Σ_i w_i, precomputed by the caller; a
/// non-positive total yields a non-finite result, which the M-steps detect
/// as a degenerate statistic.
pub fn weighted_mean(values: ArrayView1<f64>, weights: ArrayView1<f64>, total: f64) -> f64 {
    let sum: f64 = values.iter().zip(weights.iter()).map(|(&x, &w)| w * x).sum();
    sum / total
}

/// Unweighted biased variance of one column around a given mean.
///
/// Used by the families' moment seeds; callers guarantee a non-empty view.
pub fn column_variance(values: ArrayView1<f64>, mean: f64) -> f64 {
    let sum: f64 = values
        .iter()
        .map(|&x| {
            let centered = x - mean;
            centered * centered
        })
        .sum();
    sum / values.len() as f64
}

/// Responsibility-weighted variance of one column around a given mean.
///
/// Same `total` convention as [`weighted_mean`]. The result is the biased
/// (maximum-likelihood) variance, matching the M-step estimators.
pub fn weighted_variance(
    values: ArrayView1<f64>, weights: ArrayView1<f64>, total: f64, mean: f64,
) -> f64 {
    let sum: f64 = values
        .iter()
        .zip(weights.iter())
        .map(|(&x, &w)| {
            let centered = x - mean;
            w * centered * centered
        })
        .sum();
    sum / total
}
