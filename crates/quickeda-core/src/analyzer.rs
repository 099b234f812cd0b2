//! High-level analysis entry point
//!
//! [`DataAnalyzer`] owns a raw table and its configuration and runs the
//! univariate, bivariate and multivariate analyses on it.

use crate::bivariate::{
    bivariate_stats, check_heteroscedasticity, group_stats, regression_stats, AssociationTable,
    AssociationTest,
};
use crate::diagnostics::{compute_metrics, compute_vif, rank_coefficients};
use crate::errors::{StatsError, StatsResult};
use crate::models::fit_linear_model;
use crate::prepare::prepare_with;
use crate::render::{BarChart, ChartRenderer, ScatterChart};
use crate::stepwise::stepwise_eliminate_with;
use crate::table::{ColumnKind, RawTable};
use crate::types::{
    AnalysisConfig, CoefficientTable, FittedModel, MetricsRecord, StepwiseOptions, StepwiseTrace,
    VifTable,
};
use crate::univariate::{split_univariate_stats, univariate_stats, UnivariateSplit, UnivariateTable};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// Kind of multivariate analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultivariateMethod {
    /// Fit every predictor, report ranked coefficients and metrics
    #[default]
    Full,
    /// Collinearity of the predictors
    Vif,
    /// Backward stepwise elimination
    Stepwise,
}

impl FromStr for MultivariateMethod {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(MultivariateMethod::Full),
            "vif" => Ok(MultivariateMethod::Vif),
            "stepwise" => Ok(MultivariateMethod::Stepwise),
            other => Err(StatsError::Configuration(format!(
                "method must be 'full', 'vif', or 'stepwise', got '{other}'"
            ))),
        }
    }
}

/// Result of a multivariate analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MultivariateReport {
    Full {
        model: FittedModel,
        coefficients: CoefficientTable,
        metrics: MetricsRecord,
    },
    Vif(VifTable),
    Stepwise(StepwiseTrace),
}

/// Association table plus one rendered chart per tested feature
#[derive(Debug, Clone)]
pub struct BivariateReport<H> {
    pub associations: AssociationTable,
    /// `(feature, chart)` in association order
    pub charts: Vec<(String, H)>,
}

impl<H> BivariateReport<H> {
    pub fn chart(&self, feature: &str) -> Option<&H> {
        self.charts
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, handle)| handle)
    }
}

/// Exploratory analysis over one table
#[derive(Debug, Clone)]
pub struct DataAnalyzer {
    table: RawTable,
    config: AnalysisConfig,
}

impl DataAnalyzer {
    pub fn new(table: RawTable) -> Self {
        Self {
            table,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(table: RawTable, config: AnalysisConfig) -> StatsResult<Self> {
        config.validate()?;
        Ok(Self { table, config })
    }

    pub fn table(&self) -> &RawTable {
        &self.table
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Column summaries ordered by `sort_by` (`skew`, `kurt`, `missing`, `unique`, `std`)
    pub fn univariate_analysis(&self, sort_by: &str) -> StatsResult<UnivariateTable> {
        univariate_stats(&self.table, sort_by.parse()?)
    }

    pub fn univariate_split(&self) -> StatsResult<UnivariateSplit> {
        split_univariate_stats(&self.table)
    }

    /// Test every feature against `label` and render a chart for each tested one
    ///
    /// Pearson rows get a scatter chart with the regression line and
    /// heteroscedasticity tests; ANOVA rows get a bar chart of group means.
    pub fn bivariate_analysis<R: ChartRenderer>(
        &self,
        label: &str,
        renderer: &R,
    ) -> StatsResult<BivariateReport<R::Handle>> {
        let associations = bivariate_stats(&self.table, label)?;
        let mut charts = Vec::with_capacity(associations.len());

        for row in associations.iter() {
            let feature = row.feature.as_str();
            let handle = match row.test {
                AssociationTest::PearsonR { .. } => {
                    let x = self.table.numeric_column(feature)?;
                    let y = self.table.numeric_column(label)?;
                    let chart = ScatterChart {
                        feature: feature.to_string(),
                        label: label.to_string(),
                        regression: regression_stats(&x, &y)?,
                        heteroscedasticity: check_heteroscedasticity(&self.table, feature, label)?,
                        x,
                        y,
                    };
                    renderer.scatter(&chart)?
                }
                AssociationTest::AnovaF { .. } => {
                    let chart = BarChart {
                        feature: feature.to_string(),
                        label: label.to_string(),
                        stats: group_stats(&self.table, feature, label, &self.config.group_tests)?,
                    };
                    renderer.bar(&chart)?
                }
                AssociationTest::HasMissing => {
                    debug!(feature, "no chart for a feature with missing values");
                    continue;
                }
                AssociationTest::Untestable { .. } => {
                    debug!(feature, "no chart for an untestable feature");
                    continue;
                }
            };
            charts.push((row.feature.clone(), handle));
        }

        info!(
            label,
            features = associations.len(),
            charts = charts.len(),
            "bivariate analysis finished"
        );

        Ok(BivariateReport {
            associations,
            charts,
        })
    }

    /// Regression diagnostics of `target` on the prepared table
    ///
    /// `method` is `full`, `vif` or `stepwise`. Every method prepares the
    /// table with `config.prepare`. `min_features` only applies to `stepwise`
    /// and defaults to `config.min_features`.
    pub fn multivariate_analysis(
        &self,
        target: &str,
        method: &str,
        min_features: Option<usize>,
    ) -> StatsResult<MultivariateReport> {
        let method: MultivariateMethod = method.parse()?;

        if self.table.kind(target) != Some(ColumnKind::Numeric) {
            return Err(StatsError::InvalidTarget(target.to_string()));
        }

        debug!(response = target, ?method, "multivariate analysis");

        match method {
            MultivariateMethod::Vif => {
                let prepared = prepare_with(&self.table, &self.config.prepare)?;
                compute_vif(&prepared, Some(target)).map(MultivariateReport::Vif)
            }
            MultivariateMethod::Full => {
                let prepared = prepare_with(&self.table, &self.config.prepare)?;
                let model = fit_linear_model(&prepared, target)?;
                let coefficients = rank_coefficients(&model);
                let metrics = compute_metrics(&model, &model.observed)?;
                Ok(MultivariateReport::Full {
                    model,
                    coefficients,
                    metrics,
                })
            }
            MultivariateMethod::Stepwise => {
                let options = StepwiseOptions {
                    min_features: min_features.unwrap_or(self.config.min_features),
                    prepare: self.config.prepare.clone(),
                };
                stepwise_eliminate_with(&self.table, target, &options)
                    .map(MultivariateReport::Stepwise)
            }
        }
    }
}
