//! Heteroscedasticity tests on regression residuals
//!
//! - Breusch-Pagan (Koenker's studentized LM form, plus the F form)
//! - White (adds squares and cross products of the regressors)
//!
//! Both regress the squared residuals on an auxiliary design and report
//! LM = n * R²_aux ~ χ²(k) and the auxiliary regression's F-statistic.

use crate::errors::{StatsError, StatsResult};
use crate::models::fit_ols;
use crate::types::OlsOptions;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Which auxiliary regression was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeteroscedasticityTest {
    BreuschPagan,
    White,
}

/// Result of a heteroscedasticity test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeteroscedasticityResult {
    pub test: HeteroscedasticityTest,
    /// Lagrange multiplier statistic n * R²
    pub lm_statistic: f64,
    pub lm_pvalue: f64,
    pub f_statistic: f64,
    pub f_pvalue: f64,
    /// Number of auxiliary regressors (excluding the constant)
    pub df: usize,
}

/// Breusch-Pagan test
///
/// # Arguments
/// * `residuals` - Residuals of the primary regression
/// * `exog` - Regressors of the primary regression, without the constant
pub fn breusch_pagan(residuals: &[f64], exog: &[&[f64]]) -> StatsResult<HeteroscedasticityResult> {
    auxiliary_test(HeteroscedasticityTest::BreuschPagan, residuals, exog)
}

/// White's general heteroscedasticity test
///
/// The auxiliary design holds every regressor, every square and every
/// pairwise product, with exact duplicates removed (e.g. x² of a 0/1 column).
pub fn white_test(residuals: &[f64], exog: &[&[f64]]) -> StatsResult<HeteroscedasticityResult> {
    let mut columns: Vec<Vec<f64>> = exog.iter().map(|c| c.to_vec()).collect();

    for i in 0..exog.len() {
        for j in i..exog.len() {
            let product: Vec<f64> = exog[i].iter().zip(exog[j]).map(|(a, b)| a * b).collect();
            if !columns.contains(&product) {
                columns.push(product);
            }
        }
    }

    let views: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
    auxiliary_test(HeteroscedasticityTest::White, residuals, &views)
}

fn auxiliary_test(
    test: HeteroscedasticityTest,
    residuals: &[f64],
    regressors: &[&[f64]],
) -> StatsResult<HeteroscedasticityResult> {
    if regressors.is_empty() {
        return Err(StatsError::EmptyInput { field: "exog" });
    }

    let n = residuals.len();
    let squared: Vec<f64> = residuals.iter().map(|e| e * e).collect();

    let options = OlsOptions {
        fit_intercept: true,
        compute_inference: false,
    };
    let aux = fit_ols(&squared, regressors, &options)?;

    // Homoscedastic to machine precision: no evidence against the null
    let r_squared = if aux.sst == 0.0 { 0.0 } else { aux.r_squared };

    let df = regressors.len();
    let lm_statistic = n as f64 * r_squared;
    let chi2 = ChiSquared::new(df as f64)
        .map_err(|e| StatsError::InvalidInput(format!("chi-squared with df={df}: {e}")))?;
    let lm_pvalue = (1.0 - chi2.cdf(lm_statistic)).clamp(0.0, 1.0);

    let (f_statistic, f_pvalue) = if aux.sst == 0.0 {
        (0.0, 1.0)
    } else {
        (aux.f_statistic, aux.f_pvalue)
    };

    Ok(HeteroscedasticityResult {
        test,
        lm_statistic,
        lm_pvalue,
        f_statistic,
        f_pvalue,
        df,
    })
}
