//! Ordinary Least Squares (OLS) regression

use crate::errors::{StatsError, StatsResult};
use crate::table::PreparedTable;
use crate::types::{Coefficient, FittedModel, OlsOptions, INTERCEPT};
use faer::{Col, Mat};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Pivots of the Gram matrix below this fraction of the largest pivot are
/// treated as exact linear dependence.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Raw OLS estimates on unnamed column slices
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Estimates in design order (intercept first when fitted)
    pub coefficients: Vec<f64>,
    /// Standard errors, empty unless inference was requested
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Sum of squared residuals
    pub sse: f64,
    /// Total sum of squares (centered when an intercept is fitted); 0 for a constant response
    pub sst: f64,
    /// NaN when `sst` is zero
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_pvalue: f64,
    pub n_observations: usize,
    pub n_features: usize,
    pub df_residual: usize,
    pub has_intercept: bool,
}

/// Fit an OLS regression model
///
/// # Arguments
/// * `y` - Response variable (n observations)
/// * `x` - Feature columns (p columns of n observations)
/// * `options` - Fitting options
pub fn fit_ols(y: &[f64], x: &[&[f64]], options: &OlsOptions) -> StatsResult<OlsFit> {
    let names: Vec<String> = (0..x.len()).map(|j| format!("x{j}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    fit_named("y", y, &names, x, options)
}

/// Fit `target` on every other column of a prepared table, with intercept
pub fn fit_linear_model(table: &PreparedTable, target: &str) -> StatsResult<FittedModel> {
    let y = table
        .column(target)
        .ok_or_else(|| StatsError::InvalidTarget(target.to_string()))?;

    let (names, columns): (Vec<&str>, Vec<&[f64]>) =
        table.columns().filter(|(name, _)| *name != target).unzip();

    if names.contains(&INTERCEPT) {
        return Err(StatsError::InvalidInput(format!(
            "predictor name '{INTERCEPT}' is reserved for the constant term"
        )));
    }

    let fit = fit_named(target, y, &names, &columns, &OlsOptions::default())?;

    if fit.sst == 0.0 {
        return Err(StatsError::DegenerateColumn {
            column: target.to_string(),
        });
    }

    let terms = std::iter::once(INTERCEPT)
        .chain(names.iter().copied())
        .enumerate()
        .map(|(j, name)| Coefficient {
            name: name.to_string(),
            estimate: fit.coefficients[j],
            std_error: fit.std_errors[j],
            t_statistic: fit.t_values[j],
            p_value: fit.p_values[j],
        })
        .collect();

    Ok(FittedModel {
        target: target.to_string(),
        terms,
        fitted_values: fit.fitted,
        residuals: fit.residuals,
        observed: y.to_vec(),
        r_squared: fit.r_squared,
        adj_r_squared: fit.adj_r_squared,
        f_statistic: fit.f_statistic,
        f_pvalue: fit.f_pvalue,
        n_observations: fit.n_observations,
        df_residual: fit.df_residual,
    })
}

/// OLS with column names for error reporting
pub(crate) fn fit_named(
    target: &str,
    y: &[f64],
    names: &[&str],
    x: &[&[f64]],
    options: &OlsOptions,
) -> StatsResult<OlsFit> {
    // Validate inputs
    if y.is_empty() {
        return Err(StatsError::EmptyInput { field: "y" });
    }

    let n_obs = y.len();
    let n_features = x.len();

    for col in x.iter() {
        if col.len() != n_obs {
            return Err(StatsError::DimensionMismatch {
                expected: n_obs,
                got: col.len(),
            });
        }
    }

    if y.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::MissingValues {
            column: target.to_string(),
        });
    }
    for (name, col) in names.iter().zip(x) {
        if col.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::MissingValues {
                column: name.to_string(),
            });
        }
    }

    let n_params = n_features + usize::from(options.fit_intercept);
    if n_params == 0 {
        return Err(StatsError::EmptyInput { field: "x" });
    }
    if n_obs <= n_params {
        return Err(StatsError::InsufficientSamples {
            rows: n_obs,
            predictors: n_features,
        });
    }

    let offset = usize::from(options.fit_intercept);
    let design = Mat::from_fn(n_obs, n_params, |i, j| {
        if j < offset {
            1.0
        } else {
            x[j - offset][i]
        }
    });
    let y_col = Col::from_fn(n_obs, |i| y[i]);

    let xtx = design.transpose() * &design;
    let xtx_inv = invert_gram(&xtx).map_err(|j| StatsError::SingularMatrix {
        column: if j < offset {
            INTERCEPT.to_string()
        } else {
            names[j - offset].to_string()
        },
    })?;

    let xty = design.transpose() * &y_col;
    let coefficients: Vec<f64> = (0..n_params)
        .map(|j| (0..n_params).map(|l| xtx_inv[(j, l)] * xty[l]).sum())
        .collect();

    let fitted: Vec<f64> = (0..n_obs)
        .map(|i| {
            (0..n_params)
                .map(|j| design[(i, j)] * coefficients[j])
                .sum()
        })
        .collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
    let sse: f64 = residuals.iter().map(|e| e * e).sum();

    let constant_response = y.iter().all(|&v| v == y[0]);
    let sst = if constant_response && options.fit_intercept {
        0.0
    } else if options.fit_intercept {
        let mean = y.iter().sum::<f64>() / n_obs as f64;
        y.iter().map(|v| (v - mean).powi(2)).sum()
    } else {
        y.iter().map(|v| v * v).sum()
    };

    let df_residual = n_obs - n_params;
    let df = df_residual as f64;

    let r_squared = if sst > 0.0 {
        (1.0 - sse / sst).clamp(0.0, 1.0)
    } else {
        f64::NAN
    };
    let n_eff = if options.fit_intercept {
        n_obs as f64 - 1.0
    } else {
        n_obs as f64
    };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * n_eff / df;

    let (f_statistic, f_pvalue) = overall_f_test(r_squared, n_features, df_residual)?;

    let (std_errors, t_values, p_values) = if options.compute_inference {
        let sigma2 = sse / df;
        let std_errors: Vec<f64> = (0..n_params)
            .map(|j| (sigma2 * xtx_inv[(j, j)]).max(0.0).sqrt())
            .collect();
        let t_values: Vec<f64> = coefficients
            .iter()
            .zip(&std_errors)
            .map(|(&b, &se)| t_statistic(b, se))
            .collect();
        let p_values = two_sided_p_values(&t_values, df)?;
        (std_errors, t_values, p_values)
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    Ok(OlsFit {
        coefficients,
        std_errors,
        t_values,
        p_values,
        fitted,
        residuals,
        sse,
        sst,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_pvalue,
        n_observations: n_obs,
        n_features,
        df_residual,
        has_intercept: options.fit_intercept,
    })
}

/// Invert a symmetric Gram matrix through its QR decomposition.
///
/// On failure returns the index of the first column whose pivot collapses,
/// i.e. the first design column lying in the span of the preceding ones.
fn invert_gram(xtx: &Mat<f64>) -> Result<Mat<f64>, usize> {
    let size = xtx.nrows();

    let qr = xtx.qr();
    let q = qr.compute_Q();
    let r = qr.R();

    let max_pivot = (0..size).map(|i| r[(i, i)].abs()).fold(0.0_f64, f64::max);
    if max_pivot == 0.0 {
        return Err(0);
    }
    if let Some(j) = (0..size).find(|&i| r[(i, i)].abs() <= SINGULAR_TOLERANCE * max_pivot) {
        return Err(j);
    }

    // Solve R * X = Q' column by column
    let mut inv = Mat::zeros(size, size);
    let qt = q.transpose();

    for col in 0..size {
        for i in (0..size).rev() {
            let mut sum = qt[(i, col)];
            for j in (i + 1)..size {
                sum -= r[(i, j)] * inv[(j, col)];
            }
            inv[(i, col)] = sum / r[(i, i)];
        }
    }

    Ok(inv)
}

/// t = β / SE, saturating to ±∞ when the fit is exact
fn t_statistic(estimate: f64, std_error: f64) -> f64 {
    if std_error > 0.0 {
        estimate / std_error
    } else if estimate == 0.0 {
        0.0
    } else {
        estimate.signum() * f64::INFINITY
    }
}

/// p_j = 2 * P(|T| > |t_j|) where T ~ t(df)
pub(crate) fn two_sided_p_values(t_values: &[f64], df: f64) -> StatsResult<Vec<f64>> {
    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatsError::InvalidInput(format!("t distribution with df={df}: {e}")))?;

    Ok(t_values
        .iter()
        .map(|t| {
            let abs_t = t.abs();
            if abs_t.is_infinite() {
                0.0
            } else {
                (2.0 * (1.0 - t_dist.cdf(abs_t))).clamp(0.0, 1.0)
            }
        })
        .collect())
}

/// Overall F-test of all slopes equal to zero
fn overall_f_test(r_squared: f64, n_features: usize, df_residual: usize) -> StatsResult<(f64, f64)> {
    if n_features == 0 || r_squared.is_nan() {
        return Ok((f64::NAN, f64::NAN));
    }

    let d1 = n_features as f64;
    let d2 = df_residual as f64;
    if r_squared >= 1.0 {
        return Ok((f64::INFINITY, 0.0));
    }

    let f = (r_squared / d1) / ((1.0 - r_squared) / d2);
    let f_dist = FisherSnedecor::new(d1, d2)
        .map_err(|e| StatsError::InvalidInput(format!("F distribution ({d1}, {d2}): {e}")))?;
    Ok((f, (1.0 - f_dist.cdf(f)).clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_ols() {
        // Simple linear relationship: y = 2*x + 1
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 5.0, 7.0, 9.0, 11.0];

        let result = fit_ols(&y, &[&x], &OlsOptions::default()).unwrap();

        assert!((result.coefficients[0] - 1.0).abs() < 1e-9);
        assert!((result.coefficients[1] - 2.0).abs() < 1e-9);
        assert!(result.r_squared > 0.999_999);
        assert!(result.sse < 1e-18);
    }

    #[test]
    fn test_ols_with_inference() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let y = [2.1, 4.0, 5.9, 8.1, 10.0, 11.9, 14.1, 16.0, 17.9, 20.1];

        let result = fit_ols(&y, &[&x], &OlsOptions::default()).unwrap();

        assert_eq!(result.p_values.len(), 2);
        // slope is highly significant
        assert!(result.p_values[1] < 0.05);
        assert!(result.t_values[1] > 10.0);
        assert_eq!(result.df_residual, 8);
        assert!(result.f_pvalue < 0.05);
        // F equals t² in simple regression
        assert!((result.f_statistic - result.t_values[1].powi(2)).abs() / result.f_statistic < 1e-8);
    }

    #[test]
    fn test_two_predictors_recover_coefficients() {
        // y = 1 + 2*x1 - 3*x2, exact
        let x1 = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let x2 = [1.0, 0.0, 2.0, 1.0, 3.0, 2.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(&x2)
            .map(|(a, b)| 1.0 + 2.0 * a - 3.0 * b)
            .collect();

        let result = fit_ols(&y, &[&x1, &x2], &OlsOptions::default()).unwrap();
        assert!((result.coefficients[0] - 1.0).abs() < 1e-8);
        assert!((result.coefficients[1] - 2.0).abs() < 1e-8);
        assert!((result.coefficients[2] + 3.0).abs() < 1e-8);
    }

    #[test]
    fn test_ols_dimension_mismatch() {
        let x = [1.0, 2.0, 3.0];
        let y = [1.0, 2.0];

        let result = fit_ols(&y, &[&x], &OlsOptions::default());
        assert!(matches!(result, Err(StatsError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_ols_insufficient_data() {
        let x = [1.0, 2.0];
        let y = [1.0, 2.0];

        let result = fit_ols(&y, &[&x], &OlsOptions::default());
        assert!(matches!(
            result,
            Err(StatsError::InsufficientSamples {
                rows: 2,
                predictors: 1
            })
        ));
    }

    #[test]
    fn test_ols_singular_names_dependent_column() {
        let x1 = [1.0, 2.0, 3.0, 4.0, 5.0];
        let x2 = [2.0, 4.0, 6.0, 8.0, 10.0];
        let y = [1.0, 3.0, 2.0, 5.0, 4.0];

        let result = fit_ols(&y, &[&x1, &x2], &OlsOptions::default());
        assert!(matches!(
            result,
            Err(StatsError::SingularMatrix { column }) if column == "x1"
        ));
    }

    #[test]
    fn test_ols_constant_predictor_is_singular_with_intercept() {
        let x = [3.0, 3.0, 3.0, 3.0];
        let y = [1.0, 2.0, 3.0, 5.0];

        let result = fit_ols(&y, &[&x], &OlsOptions::default());
        assert!(matches!(result, Err(StatsError::SingularMatrix { .. })));
    }

    #[test]
    fn test_ols_rejects_nan() {
        let x = [1.0, f64::NAN, 3.0, 4.0];
        let y = [1.0, 2.0, 3.0, 5.0];

        let result = fit_ols(&y, &[&x], &OlsOptions::default());
        assert!(matches!(
            result,
            Err(StatsError::MissingValues { column }) if column == "x0"
        ));
    }

    #[test]
    fn test_intercept_only_model() {
        let y = [1.0, 2.0, 3.0, 6.0];
        let result = fit_ols(&y, &[], &OlsOptions::default()).unwrap();
        assert!((result.coefficients[0] - 3.0).abs() < 1e-12);
        assert!(result.r_squared.abs() < 1e-12);
        assert!(result.f_statistic.is_nan());
    }

    #[test]
    fn test_fit_linear_model_on_table() {
        let table = PreparedTable::new(vec![
            ("x", vec![0.0, 0.25, 0.5, 0.75, 1.0]),
            ("y", vec![0.1, 0.3, 0.45, 0.8, 0.95]),
        ])
        .unwrap();

        let model = fit_linear_model(&table, "y").unwrap();
        assert_eq!(model.terms.len(), 2);
        assert_eq!(model.terms[0].name, INTERCEPT);
        assert!(model.coefficient("x").unwrap().estimate > 0.0);
        assert_eq!(model.fitted_values.len(), 5);
        assert_eq!(model.predictors().collect::<Vec<_>>(), vec!["x"]);

        // residuals sum to zero with an intercept
        let sum: f64 = model.residuals.iter().sum();
        assert!(sum.abs() < 1e-10);
    }

    #[test]
    fn test_fit_linear_model_missing_target() {
        let table = PreparedTable::new(vec![("x", vec![0.0, 1.0, 0.5])]).unwrap();
        assert!(matches!(
            fit_linear_model(&table, "y"),
            Err(StatsError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_fit_linear_model_constant_target() {
        let table = PreparedTable::new(vec![
            ("x", vec![0.0, 0.5, 1.0, 0.2]),
            ("y", vec![0.3, 0.3, 0.3, 0.3]),
        ])
        .unwrap();
        assert!(matches!(
            fit_linear_model(&table, "y"),
            Err(StatsError::DegenerateColumn { column }) if column == "y"
        ));
    }
}
