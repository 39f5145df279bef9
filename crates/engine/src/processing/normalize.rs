//! Quantile normalization
//!
//! The matrix has one row per design element and one column per bioassay.
//! After normalization every column has the same value distribution: the
//! mean of the sorted columns.
//!
//! Missing values (NaN) stay missing and do not take part. A column with
//! fewer present values than rows is stretched onto the reference by
//! relative rank, so its smallest value maps to the reference minimum and
//! its largest to the reference maximum. Tied values in a column all get
//! the mean of the reference values their ranks span.

use exprvec_core::{QuantitationType, ScaleType, StandardQuantitationType};
use std::cmp::Ordering;
use std::fmt;

/// Whether quantile normalization ran, and if not why
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationDecision {
    /// The matrix was normalized
    Applied,
    /// Not more vectors than the configured threshold
    BelowThreshold {
        /// Vectors in the experiment
        vectors: usize,
        /// Configured threshold
        threshold: usize,
    },
    /// The data are counts
    CountData,
    /// The data are ratios
    RatioData,
    /// Vectors do not share one dimension, so there is no common column space
    RaggedDimensions,
}

impl NormalizationDecision {
    /// Whether normalization ran
    pub fn applied(&self) -> bool {
        matches!(self, NormalizationDecision::Applied)
    }
}

impl fmt::Display for NormalizationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationDecision::Applied => write!(f, "quantile normalized"),
            NormalizationDecision::BelowThreshold { vectors, threshold } => write!(
                f,
                "skipped: {} vectors is not more than the threshold of {}",
                vectors, threshold
            ),
            NormalizationDecision::CountData => write!(f, "skipped: count data"),
            NormalizationDecision::RatioData => write!(f, "skipped: ratio data"),
            NormalizationDecision::RaggedDimensions => {
                write!(f, "skipped: vectors use different bioassay dimensions")
            }
        }
    }
}

/// Decide whether a data set qualifies for quantile normalization
///
/// Count and ratio data are never normalized. Otherwise the data set must
/// have strictly more than `threshold` vectors and a single dimension.
pub fn should_renormalize(
    quantitation_type: &QuantitationType,
    vectors: usize,
    single_dimension: bool,
    threshold: usize,
) -> NormalizationDecision {
    if quantitation_type.standard_type == StandardQuantitationType::Count
        || quantitation_type.scale == ScaleType::Count
    {
        return NormalizationDecision::CountData;
    }
    if quantitation_type.is_ratio || quantitation_type.standard_type == StandardQuantitationType::Ratio
    {
        return NormalizationDecision::RatioData;
    }
    if vectors <= threshold {
        return NormalizationDecision::BelowThreshold { vectors, threshold };
    }
    if !single_dimension {
        return NormalizationDecision::RaggedDimensions;
    }
    NormalizationDecision::Applied
}

/// Quantile-normalize `rows` in place
///
/// Rows must all have the same length; shorter rows are treated as missing
/// the trailing columns. The matrix shape never changes.
pub fn quantile_normalize(rows: &mut [Vec<f64>]) {
    let n = rows.len();
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if n == 0 || cols == 0 {
        return;
    }

    // Present values of each column with their row, sorted by value
    let columns: Vec<Vec<(usize, f64)>> = (0..cols)
        .map(|j| {
            let mut col: Vec<(usize, f64)> = rows
                .iter()
                .enumerate()
                .filter_map(|(i, row)| row.get(j).copied().filter(|v| !v.is_nan()).map(|v| (i, v)))
                .collect();
            col.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            col
        })
        .collect();

    let reference = reference_distribution(&columns, n);
    if reference.is_empty() {
        return;
    }

    for (j, col) in columns.iter().enumerate().filter(|(_, c)| !c.is_empty()) {
        let k = col.len();
        let mut start = 0;
        while start < k {
            let mut end = start;
            while end + 1 < k && col[end + 1].1 == col[start].1 {
                end += 1;
            }
            let sum: f64 = (start..=end)
                .map(|r| interpolate(&reference, rank_position(r, k, n)))
                .sum();
            let value = sum / (end - start + 1) as f64;
            for &(i, _) in &col[start..=end] {
                rows[i][j] = value;
            }
            start = end + 1;
        }
    }
}

/// Mean of the sorted columns, each stretched to `n` points
fn reference_distribution(columns: &[Vec<(usize, f64)>], n: usize) -> Vec<f64> {
    let mut sums = vec![0.0; n];
    let mut contributing = 0usize;
    for col in columns.iter().filter(|c| !c.is_empty()) {
        let sorted: Vec<f64> = col.iter().map(|&(_, v)| v).collect();
        for (p, sum) in sums.iter_mut().enumerate() {
            let pos = if n > 1 {
                p as f64 * (sorted.len() - 1) as f64 / (n - 1) as f64
            } else {
                0.0
            };
            *sum += interpolate(&sorted, pos);
        }
        contributing += 1;
    }
    if contributing == 0 {
        return Vec::new();
    }
    sums.iter().map(|s| s / contributing as f64).collect()
}

/// Position on an `n`-point reference for rank `r` of `k` present values
fn rank_position(r: usize, k: usize, n: usize) -> f64 {
    if k > 1 {
        r as f64 * (n - 1) as f64 / (k - 1) as f64
    } else {
        (n - 1) as f64 / 2.0
    }
}

/// Linear interpolation into a sorted sequence at fractional index `pos`
fn interpolate(sorted: &[f64], pos: f64) -> f64 {
    let last = sorted.len() - 1;
    let lo = (pos.floor() as usize).min(last);
    let hi = (pos.ceil() as usize).min(last);
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
