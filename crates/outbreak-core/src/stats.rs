//! Summary statistics used when aggregating an ensemble

use statrs::statistics::Statistics;

/// z-score for a two-sided 95% normal interval
const Z_95: f64 = 1.96;

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.mean()
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.std_dev()
}

/// Normal-approximation 95% confidence interval for the mean.
///
/// The lower bound is clamped at 0 since the inputs are day counts.
pub fn confidence_interval_95(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let m = mean(values);
    let margin = Z_95 * sample_std_dev(values) / (values.len() as f64).sqrt();
    ((m - margin).max(0.0), m + margin)
}

/// Elementwise mean of equally long integer series
pub fn elementwise_mean<'a, I>(series: I, len: usize) -> Vec<f64>
where
    I: IntoIterator<Item = &'a [u64]>,
{
    let mut totals = vec![0.0; len];
    let mut count = 0usize;
    for values in series {
        for (total, &value) in totals.iter_mut().zip(values) {
            *total += value as f64;
        }
        count += 1;
    }
    if count > 0 {
        for total in &mut totals {
            *total /= count as f64;
        }
    }
    totals
}
