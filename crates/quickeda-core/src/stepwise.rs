//! Backward stepwise feature elimination
//!
//! Starting from every predictor, each round fits an OLS model, records its
//! metrics, and drops the predictor with the weakest |t|. A step is recorded
//! for every feature count strictly greater than `min_features`; the model
//! with exactly `min_features` predictors is never fitted.
//!
//! Any failure inside a round aborts the run with `StatsError::StepFailed`
//! naming the feature count at which it happened. No partial trace is
//! returned.

use crate::diagnostics::{compute_metrics, rank_coefficients};
use crate::errors::{StatsError, StatsResult};
use crate::models::fit_linear_model;
use crate::prepare::prepare_with;
use crate::table::{ColumnKind, PreparedTable, RawTable};
use crate::types::{StepwiseOptions, StepwiseStep, StepwiseTrace};
use tracing::{debug, info};

/// Prepare `table` and eliminate predictors until `min_features` remain
pub fn stepwise_eliminate(
    table: &RawTable,
    target: &str,
    min_features: usize,
) -> StatsResult<StepwiseTrace> {
    stepwise_eliminate_with(
        table,
        target,
        &StepwiseOptions {
            min_features,
            ..Default::default()
        },
    )
}

/// Stepwise elimination with explicit preparation options
pub fn stepwise_eliminate_with(
    table: &RawTable,
    target: &str,
    options: &StepwiseOptions,
) -> StatsResult<StepwiseTrace> {
    match table.kind(target) {
        Some(ColumnKind::Numeric) => {}
        _ => return Err(StatsError::InvalidTarget(target.to_string())),
    }

    let prepared = prepare_with(table, &options.prepare)?;
    stepwise_eliminate_prepared(&prepared, target, options.min_features)
}

/// Stepwise elimination on an already prepared table
pub fn stepwise_eliminate_prepared(
    prepared: &PreparedTable,
    target: &str,
    min_features: usize,
) -> StatsResult<StepwiseTrace> {
    if !prepared.contains(target) {
        return Err(StatsError::InvalidTarget(target.to_string()));
    }

    let mut features: Vec<String> = prepared
        .names()
        .iter()
        .filter(|name| name.as_str() != target)
        .cloned()
        .collect();

    if min_features >= features.len() {
        return Err(StatsError::Configuration(format!(
            "min_features ({min_features}) must be less than the number of available predictors ({})",
            features.len()
        )));
    }

    let mut trace = StepwiseTrace::new(target, min_features);

    // One predictor leaves per round
    let rounds = features.len() - min_features;
    for _ in 0..rounds {
        let feature_count = features.len();
        let step = eliminate_once(prepared, target, &features).map_err(|e| {
            StatsError::StepFailed {
                feature_count,
                source: Box::new(e),
            }
        })?;

        debug!(
            feature_count,
            dropped = %step.dropped,
            r_squared = step.metrics.r_squared,
            adj_r_squared = step.metrics.adj_r_squared,
            "stepwise round"
        );

        features.retain(|f| *f != step.dropped);
        trace.push(step)?;
    }

    info!(
        response = target,
        steps = trace.len(),
        remaining = features.len(),
        "stepwise elimination finished"
    );

    Ok(trace)
}

fn eliminate_once(
    prepared: &PreparedTable,
    target: &str,
    features: &[String],
) -> StatsResult<StepwiseStep> {
    let mut columns: Vec<&str> = features.iter().map(String::as_str).collect();
    columns.push(target);
    let working = prepared.select(&columns)?;

    let model = fit_linear_model(&working, target)?;
    let ranking = rank_coefficients(&model);
    let metrics = compute_metrics(&model, &model.observed)?;

    let dropped = ranking
        .weakest()
        .map(|r| r.name.clone())
        .ok_or_else(|| StatsError::InvalidInput("no predictor left to eliminate".into()))?;

    Ok(StepwiseStep {
        feature_count: features.len(),
        features: features.to_vec(),
        metrics,
        dropped,
    })
}
