//! Chart payloads and the rendering collaborator
//!
//! The analysis never draws anything itself. It assembles precomputed
//! statistics into chart payloads and hands them to a [`ChartRenderer`].

use crate::bivariate::{GroupStats, HeteroscedasticityReport, RegressionStats};
use crate::errors::StatsResult;
use serde::{Deserialize, Serialize};

/// Scatter of a numeric feature against the label, with its fitted line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterChart {
    pub feature: String,
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub regression: RegressionStats,
    pub heteroscedasticity: HeteroscedasticityReport,
}

impl ScatterChart {
    pub fn title(&self) -> String {
        format!("{} vs {}", self.label, self.feature)
    }

    /// Endpoints of the regression line over the observed x range
    pub fn fitted_line(&self) -> Option<((f64, f64), (f64, f64))> {
        let (lo, hi) = self
            .x
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })?;
        let at = |x: f64| self.regression.intercept + self.regression.slope * x;
        Some(((lo, at(lo)), (hi, at(hi))))
    }
}

/// Mean label value per group of a categorical feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub feature: String,
    pub label: String,
    pub stats: GroupStats,
}

impl BarChart {
    pub fn title(&self) -> String {
        format!("Mean {} by {}", self.label, self.feature)
    }
}

/// Turns chart payloads into backend-specific artifacts
pub trait ChartRenderer {
    /// Rendered chart, e.g. an SVG document or a JSON spec
    type Handle;

    fn scatter(&self, chart: &ScatterChart) -> StatsResult<Self::Handle>;

    fn bar(&self, chart: &BarChart) -> StatsResult<Self::Handle>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{HeteroscedasticityResult, HeteroscedasticityTest};

    fn scatter(x: Vec<f64>) -> ScatterChart {
        let y = x.iter().map(|v| 2.0 * v + 1.0).collect();
        ScatterChart {
            feature: "x".into(),
            label: "y".into(),
            x,
            y,
            regression: RegressionStats {
                slope: 2.0,
                intercept: 1.0,
                r_squared: 1.0,
                p_value: 0.0,
                feature_skew: None,
                label_skew: None,
            },
            heteroscedasticity: HeteroscedasticityReport {
                breusch_pagan: HeteroscedasticityResult {
                    test: HeteroscedasticityTest::BreuschPagan,
                    lm_statistic: 0.0,
                    lm_pvalue: 1.0,
                    f_statistic: 0.0,
                    f_pvalue: 1.0,
                    df: 1,
                },
                white: None,
            },
        }
    }

    #[test]
    fn test_fitted_line_spans_finite_range() {
        let chart = scatter(vec![3.0, -1.0, f64::NAN, 5.0]);
        let ((x0, y0), (x1, y1)) = chart.fitted_line().unwrap();
        assert_eq!((x0, y0), (-1.0, -1.0));
        assert_eq!((x1, y1), (5.0, 11.0));
        assert_eq!(chart.title(), "y vs x");
    }

    #[test]
    fn test_fitted_line_empty() {
        assert!(scatter(vec![]).fitted_line().is_none());
    }
}
