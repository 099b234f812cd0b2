use crate::errors::{StatsError, StatsResult};
use serde::{Deserialize, Serialize};

/// Name given to the implicit constant term of every fitted model
pub const INTERCEPT: &str = "Intercept";

// ============================================================================
// Options
// ============================================================================

/// What to do with a constant column during min-max rescaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fail with `StatsError::DegenerateColumn` (default)
    #[default]
    Error,
    /// Map every value of the column to 0
    Zero,
}

/// Options for data preparation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareOptions {
    /// Drop the original categorical columns, keeping only their indicators
    pub numeric_only: bool,
    /// Handling of zero-range columns
    pub degenerate: DegeneratePolicy,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            numeric_only: true,
            degenerate: DegeneratePolicy::Error,
        }
    }
}

/// Options for OLS fitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OlsOptions {
    /// Whether to fit an intercept term
    pub fit_intercept: bool,
    /// Whether to compute inference statistics (std errors, p-values, etc.)
    pub compute_inference: bool,
}

impl Default for OlsOptions {
    fn default() -> Self {
        Self {
            fit_intercept: true,
            compute_inference: true,
        }
    }
}

/// Options for backward stepwise elimination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepwiseOptions {
    /// Elimination stops once this many predictors remain
    pub min_features: usize,
    /// Preparation applied to the raw table before the first fit
    pub prepare: PrepareOptions,
}

impl Default for StepwiseOptions {
    fn default() -> Self {
        Self {
            min_features: 2,
            prepare: PrepareOptions::default(),
        }
    }
}

/// Options for group comparisons (ANOVA and pairwise t-tests)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupTestOptions {
    /// Family-wise significance level, split across pairwise tests (Bonferroni)
    pub alpha: f64,
}

impl Default for GroupTestOptions {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

/// Complete configuration of a `DataAnalyzer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Preparation shared by every multivariate method
    pub prepare: PrepareOptions,
    /// Stepwise stopping point when a call does not give one
    pub min_features: usize,
    pub group_tests: GroupTestOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prepare: PrepareOptions::default(),
            min_features: StepwiseOptions::default().min_features,
            group_tests: GroupTestOptions::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from JSON; absent fields take their defaults
    pub fn from_json_str(json: &str) -> StatsResult<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| StatsError::Configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StatsResult<()> {
        if !(self.group_tests.alpha > 0.0 && self.group_tests.alpha < 1.0) {
            return Err(StatsError::Configuration(format!(
                "alpha must be in (0, 1), got {}",
                self.group_tests.alpha
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Fitted model
// ============================================================================

/// One estimated term of a linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_statistic: f64,
    /// Two-sided p-value from Student's t
    pub p_value: f64,
}

/// Result of fitting an OLS model on a prepared table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    /// Name of the response column
    pub target: String,
    /// Estimated terms, intercept first
    pub terms: Vec<Coefficient>,
    pub fitted_values: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Response values the model was fitted on
    pub observed: Vec<f64>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// F-statistic for overall model significance (NaN for intercept-only)
    pub f_statistic: f64,
    pub f_pvalue: f64,
    pub n_observations: usize,
    pub df_residual: usize,
}

impl FittedModel {
    /// Look up a term by name
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.terms.iter().find(|c| c.name == name)
    }

    pub fn intercept(&self) -> Option<&Coefficient> {
        self.coefficient(INTERCEPT)
    }

    /// Predictor names in design order (intercept excluded)
    pub fn predictors(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .filter(|c| c.name != INTERCEPT)
            .map(|c| c.name.as_str())
    }

    pub fn n_predictors(&self) -> usize {
        self.predictors().count()
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Collinearity score of one predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VifEntry {
    pub predictor: String,
    /// Variance inflation factor, `f64::INFINITY` under perfect collinearity
    pub vif: f64,
    /// 1 - R² of the predictor regressed on the others, in [0, 1]
    pub tolerance: f64,
}

/// VIF scores sorted ascending (least collinear first)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VifTable {
    pub entries: Vec<VifEntry>,
}

impl VifTable {
    pub fn get(&self, predictor: &str) -> Option<&VifEntry> {
        self.entries.iter().find(|e| e.predictor == predictor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VifEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Predictors whose VIF exceeds `threshold` (commonly 5 or 10)
    pub fn above(&self, threshold: f64) -> impl Iterator<Item = &VifEntry> {
        self.entries.iter().filter(move |e| e.vif > threshold)
    }
}

/// One predictor's row in a coefficient ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCoefficient {
    pub name: String,
    pub coefficient: f64,
    pub abs_t: f64,
    pub p_value: f64,
}

/// Predictors ordered from statistically strongest to weakest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTable {
    pub rows: Vec<RankedCoefficient>,
}

impl CoefficientTable {
    pub fn strongest(&self) -> Option<&RankedCoefficient> {
        self.rows.first()
    }

    /// The elimination candidate
    pub fn weakest(&self) -> Option<&RankedCoefficient> {
        self.rows.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedCoefficient> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Goodness-of-fit and residual-error metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub rmse: f64,
    pub mae: f64,
}

// ============================================================================
// Stepwise elimination
// ============================================================================

/// Record of one elimination round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepwiseStep {
    /// Number of predictors in this step's model
    pub feature_count: usize,
    /// Predictors in this step's model, in design order
    pub features: Vec<String>,
    pub metrics: MetricsRecord,
    /// Weakest predictor, removed before the next step
    pub dropped: String,
}

/// Append-only elimination path, in strictly decreasing feature count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepwiseTrace {
    pub target: String,
    pub min_features: usize,
    steps: Vec<StepwiseStep>,
}

impl StepwiseTrace {
    pub(crate) fn new(target: impl Into<String>, min_features: usize) -> Self {
        Self {
            target: target.into(),
            min_features,
            steps: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, step: StepwiseStep) -> StatsResult<()> {
        if let Some(last) = self.steps.last() {
            if step.feature_count >= last.feature_count {
                return Err(StatsError::InvalidInput(format!(
                    "stepwise trace must shrink: {} features after {}",
                    step.feature_count, last.feature_count
                )));
            }
        }
        self.steps.push(step);
        Ok(())
    }

    /// Step whose model has exactly `feature_count` predictors
    pub fn get(&self, feature_count: usize) -> Option<&StepwiseStep> {
        // Steps are sorted by descending count
        self.steps
            .binary_search_by(|s| feature_count.cmp(&s.feature_count))
            .ok()
            .map(|i| &self.steps[i])
    }

    /// Steps in descending feature-count order
    pub fn steps(&self) -> &[StepwiseStep] {
        &self.steps
    }

    pub fn feature_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().map(|s| s.feature_count)
    }

    /// Step with the highest adjusted R²; earliest wins ties
    pub fn best_by_adj_r_squared(&self) -> Option<&StepwiseStep> {
        self.steps.iter().fold(None, |best, s| match best {
            Some(b) if b.metrics.adj_r_squared >= s.metrics.adj_r_squared => Some(b),
            _ => Some(s),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
