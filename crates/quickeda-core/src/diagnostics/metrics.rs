//! Goodness-of-fit and residual-error metrics

use crate::errors::{StatsError, StatsResult};
use crate::types::{FittedModel, MetricsRecord};

/// Compute R², adjusted R², RMSE and MAE of a fitted model against `actual`.
///
/// `actual` must be aligned row-for-row with the model's fitted values.
/// R² is taken about the mean of `actual`, so it matches the fit's own R²
/// when `actual` is the response the model was fitted on.
pub fn compute_metrics(model: &FittedModel, actual: &[f64]) -> StatsResult<MetricsRecord> {
    let n = actual.len();

    if n == 0 {
        return Err(StatsError::EmptyInput { field: "actual" });
    }
    if model.fitted_values.len() != n {
        return Err(StatsError::DimensionMismatch {
            expected: model.fitted_values.len(),
            got: n,
        });
    }
    if actual.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::MissingValues {
            column: model.target.clone(),
        });
    }

    let residuals: Vec<f64> = actual
        .iter()
        .zip(&model.fitted_values)
        .map(|(a, f)| a - f)
        .collect();

    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let mean = actual.iter().sum::<f64>() / n as f64;
    let sst: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if actual.iter().all(|&a| a == actual[0]) || sst == 0.0 {
        return Err(StatsError::DegenerateColumn {
            column: model.target.clone(),
        });
    }

    let r_squared = 1.0 - sse / sst;

    let p = model.n_predictors() as f64;
    let denom = n as f64 - p - 1.0;
    let adj_r_squared = if denom > 0.0 {
        1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / denom
    } else {
        f64::NAN
    };

    let rmse = (sse / n as f64).sqrt();
    let mae = residuals.iter().map(|e| e.abs()).sum::<f64>() / n as f64;

    Ok(MetricsRecord {
        r_squared,
        adj_r_squared,
        rmse,
        mae,
    })
}
