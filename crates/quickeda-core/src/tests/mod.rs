//! Statistical hypothesis testing
//!
//! Tests used by the bivariate analysis, computed directly on top of the
//! `statrs` distributions.


use serde::{Deserialize, Serialize};

/// Outcome of a two-sample comparison of means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub statistic: f64,
    /// Two-sided
    pub p_value: f64,
    /// Fractional under Welch's correction
    pub df: f64,
    pub n1: usize,
    pub n2: usize,
    /// e.g. "Student t-test"
    pub method: String,
}

/// One-way ANOVA decomposition and F-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    /// k - 1
    pub df_between: usize,
    /// n - k
    pub df_within: usize,
    pub ss_between: f64,
    pub ss_within: f64,
    pub n_groups: usize,
    /// Observations across all groups after NaN removal
    pub n: usize,
}

/// Pearson correlation with its t-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub r: f64,
    /// t statistic on n - 2 degrees of freedom
    pub statistic: f64,
    pub p_value: f64,
    /// Complete pairs used
    pub n: usize,
}

fn filter_nan(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|x| !x.is_nan()).collect()
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance (ddof = 1)
fn sample_variance(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() as f64 - 1.0)
}
