//! Backend-neutral chart specs
//!
//! Each chart becomes a JSON document holding the data points and the
//! statistics shown alongside them. Non-finite numbers serialize as `null`.

use crate::error::PlotError;
use quickeda_core::{BarChart, ScatterChart};
use serde_json::{json, Value};
use tracing::instrument;

#[instrument(skip_all, level = "debug")]
pub(crate) fn scatter_spec(chart: &ScatterChart) -> Result<Value, PlotError> {
    let points: Vec<[f64; 2]> = chart
        .x
        .iter()
        .zip(&chart.y)
        .map(|(&x, &y)| [x, y])
        .collect();

    let trendline = chart.fitted_line().map(|(from, to)| {
        json!({
            "from": [from.0, from.1],
            "to": [to.0, to.1],
        })
    });

    Ok(json!({
        "type": "scatter",
        "title": chart.title(),
        "x_label": chart.feature,
        "y_label": chart.label,
        "points": points,
        "regression": serde_json::to_value(&chart.regression)?,
        "trendline": trendline,
        "heteroscedasticity": serde_json::to_value(&chart.heteroscedasticity)?,
    }))
}

#[instrument(skip_all, level = "debug")]
pub(crate) fn bar_spec(chart: &BarChart) -> Result<Value, PlotError> {
    let stats = &chart.stats;
    if stats.groups.is_empty() {
        return Err(PlotError::EmptyChart(chart.title()));
    }

    Ok(json!({
        "type": "bar",
        "title": chart.title(),
        "x_label": chart.feature,
        "y_label": format!("mean {}", chart.label),
        "bars": serde_json::to_value(&stats.groups)?,
        "anova": {
            "f_statistic": stats.anova.f_statistic,
            "p_value": stats.anova.p_value,
            "df_between": stats.anova.df_between,
            "df_within": stats.anova.df_within,
        },
        "pairwise_tests": serde_json::to_value(&stats.pairwise)?,
        "skipped": serde_json::to_value(&stats.skipped)?,
        "bonferroni_threshold": stats.bonferroni_threshold,
    }))
}
