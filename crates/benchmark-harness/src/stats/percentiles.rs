//! Percentile calculations for benchmark results.
//!
//! This module provides utilities for computing percentiles and statistical
//! summaries from sample data.

/// Calculate percentile value from a slice of f64 samples.
///
/// Uses linear interpolation between nearest ranks for accurate percentile estimation.
///
/// # Arguments
///
/// * `samples` - Slice of samples (will be sorted internally)
/// * `p` - Percentile to calculate (0.0 to 100.0)
///
/// # Returns
///
/// * `Some(value)` - The percentile value
/// * `None` - If samples is empty or p is invalid
///
/// # Examples
///
/// ```
/// use benchmark_harness::stats::percentiles::percentile;
///
/// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let p50 = percentile(&data, 50.0);
/// assert_eq!(p50, Some(3.0));
/// ```
pub fn percentile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.len() == 1 {
        return Some(sorted[0]);
    }

    // Calculate the rank using linear interpolation
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower_index = rank.floor() as usize;
    let upper_index = rank.ceil() as usize;

    if lower_index == upper_index {
        Some(sorted[lower_index])
    } else {
        let lower_value = sorted[lower_index];
        let upper_value = sorted[upper_index];
        let fraction = rank - lower_index as f64;
        Some(lower_value + fraction * (upper_value - lower_value))
    }
}

/// Calculate common percentiles in one pass.
///
/// Provides a comprehensive statistical summary including min, max, quartiles,
/// mean, standard deviation, and common percentiles (p95, p99).
#[derive(Debug, Clone)]
pub struct PercentileSummary {
    pub min: f64,
    pub p25: f64,
    pub p50: f64, // median
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl PercentileSummary {
    /// Compute summary statistics from samples.
    ///
    /// # Arguments
    ///
    /// * `samples` - Slice of samples to analyze
    ///
    /// # Returns
    ///
    /// * `Some(summary)` - Statistical summary
    /// * `None` - If samples is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use benchmark_harness::stats::percentiles::PercentileSummary;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
    /// let summary = PercentileSummary::from_samples(&data).unwrap();
    /// assert_eq!(summary.count, 10);
    /// assert_eq!(summary.mean, 5.5);
    /// assert_eq!(summary.min, 1.0);
    /// assert_eq!(summary.max, 10.0);
    /// ```
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        let min = sorted[0];
        let max = sorted[count - 1];

        // Calculate mean
        let sum: f64 = sorted.iter().sum();
        let mean = sum / count as f64;

        // Calculate standard deviation (sample std dev)
        let variance = if count > 1 {
            let squared_diffs: f64 = sorted.iter().map(|&x| (x - mean).powi(2)).sum();
            squared_diffs / (count - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();

        // Calculate percentiles
        let p25 = percentile(&sorted, 25.0)?;
        let p50 = percentile(&sorted, 50.0)?;
        let p75 = percentile(&sorted, 75.0)?;
        let p95 = percentile(&sorted, 95.0)?;
        let p99 = percentile(&sorted, 99.0)?;

        Some(PercentileSummary {
            min,
            p25,
            p50,
            p75,
            p95,
            p99,
            max,
            mean,
            std_dev,
            count,
        })
    }

    /// Coefficient of variation (std_dev / mean).
    ///
    /// Returns a relative measure of variability. Lower values indicate
    /// less variability relative to the mean.
    ///
    /// # Returns
    ///
    /// The coefficient of variation, or `f64::INFINITY` if mean is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use benchmark_harness::stats::percentiles::PercentileSummary;
    ///
    /// let data = vec![10.0, 12.0, 14.0, 16.0, 18.0];
    /// let summary = PercentileSummary::from_samples(&data).unwrap();
    /// let cv = summary.coefficient_of_variation();
    /// assert!(cv > 0.0 && cv < 1.0);
    /// ```
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            f64::INFINITY
        } else {
            self.std_dev / self.mean
        }
    }
}
