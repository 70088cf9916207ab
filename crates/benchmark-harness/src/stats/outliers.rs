//! Outlier detection for benchmark results.
//!
//! This module provides utilities for detecting and filtering outliers
//! using the Interquartile Range (IQR) method.

use super::percentiles::percentile;

/// Outlier detection using Interquartile Range (IQR) method.
///
/// Outliers are detected as points that fall outside the range
/// [Q1 - 1.5*IQR, Q3 + 1.5*IQR], where IQR = Q3 - Q1.
#[derive(Debug, Clone)]
pub struct OutlierResult {
    /// Indices of detected outliers in the original sample array
    pub outlier_indices: Vec<usize>,
    /// Lower fence (Q1 - 1.5*IQR)
    pub lower_fence: f64,
    /// Upper fence (Q3 + 1.5*IQR)
    pub upper_fence: f64,
    /// First quartile (25th percentile)
    pub q1: f64,
    /// Third quartile (75th percentile)
    pub q3: f64,
    /// Interquartile range (Q3 - Q1)
    pub iqr: f64,
}

impl OutlierResult {
    /// Detect outliers in samples using IQR method.
    ///
    /// Points outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR] are considered outliers.
    ///
    /// # Arguments
    ///
    /// * `samples` - Slice of samples to analyze
    ///
    /// # Returns
    ///
    /// * `Some(result)` - Outlier detection results
    /// * `None` - If samples is empty or has insufficient data
    ///
    /// # Examples
    ///
    /// ```
    /// use benchmark_harness::stats::outliers::OutlierResult;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0]; // 100.0 is an outlier
    /// let result = OutlierResult::detect(&data).unwrap();
    /// assert!(result.has_outliers());
    /// assert_eq!(result.outlier_indices, vec![5]);
    /// ```
    pub fn detect(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        // Need at least 4 points for meaningful IQR calculation
        if samples.len() < 4 {
            return Some(OutlierResult {
                outlier_indices: Vec::new(),
                lower_fence: f64::NEG_INFINITY,
                upper_fence: f64::INFINITY,
                q1: samples[0],
                q3: samples[samples.len() - 1],
                iqr: 0.0,
            });
        }

        let q1 = percentile(samples, 25.0)?;
        let q3 = percentile(samples, 75.0)?;
        let iqr = q3 - q1;

        let lower_fence = q1 - 1.5 * iqr;
        let upper_fence = q3 + 1.5 * iqr;

        // Find outlier indices
        let outlier_indices: Vec<usize> = samples
            .iter()
            .enumerate()
            .filter_map(|(i, &value)| {
                if value < lower_fence || value > upper_fence {
                    Some(i)
                } else {
                    None
                }
            })
            .collect();

        Some(OutlierResult {
            outlier_indices,
            lower_fence,
            upper_fence,
            q1,
            q3,
            iqr,
        })
    }

    /// Get the clean samples (outliers removed).
    ///
    /// Returns a new vector containing only the non-outlier values.
    ///
    /// # Arguments
    ///
    /// * `samples` - Original sample data
    ///
    /// # Returns
    ///
    /// Vector of samples with outliers removed
    ///
    /// # Examples
    ///
    /// ```
    /// use benchmark_harness::stats::outliers::OutlierResult;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
    /// let result = OutlierResult::detect(&data).unwrap();
    /// let clean = result.clean_samples(&data);
    /// assert_eq!(clean.len(), 5); // 100.0 removed
    /// ```
    pub fn clean_samples<'a>(&self, samples: &'a [f64]) -> Vec<f64> {
        samples
            .iter()
            .enumerate()
            .filter_map(|(i, &value)| {
                if self.outlier_indices.contains(&i) {
                    None
                } else {
                    Some(value)
                }
            })
            .collect()
    }

    /// Check if any outliers were detected.
    ///
    /// # Returns
    ///
    /// `true` if at least one outlier was found, `false` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use benchmark_harness::stats::outliers::OutlierResult;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    /// let result = OutlierResult::detect(&data).unwrap();
    /// assert!(!result.has_outliers());
    ///
    /// let data_with_outlier = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
    /// let result2 = OutlierResult::detect(&data_with_outlier).unwrap();
    /// assert!(result2.has_outliers());
    /// ```
    pub fn has_outliers(&self) -> bool {
        !self.outlier_indices.is_empty()
    }
}

/// Remove warmup iterations from the beginning.
///
/// Benchmark runs often have initial "warmup" iterations that should be
/// excluded from analysis due to cold start effects.
///
/// # Arguments
///
/// * `samples` - Original sample data
/// * `warmup_count` - Number of warmup samples to remove from the beginning
///
/// # Returns
///
/// Slice of samples with warmup iterations removed
///
/// # Examples
///
/// ```
/// use benchmark_harness::stats::outliers::remove_warmup;
///
/// let data = vec![100.0, 95.0, 10.0, 11.0, 10.5, 11.5]; // First 2 are warmup
/// let clean = remove_warmup(&data, 2);
/// assert_eq!(clean, &[10.0, 11.0, 10.5, 11.5]);
/// ```
pub fn remove_warmup(samples: &[f64], warmup_count: usize) -> &[f64] {
    if warmup_count >= samples.len() {
        &[]
    } else {
        &samples[warmup_count..]
    }
}
