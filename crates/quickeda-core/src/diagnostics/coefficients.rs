//! Coefficient ranking by statistical strength

use crate::types::{CoefficientTable, FittedModel, RankedCoefficient, INTERCEPT};
use std::cmp::Ordering;

/// Rank the predictors of a fitted model, strongest first.
///
/// Order: |t| descending, then p-value ascending, then name. A NaN |t|
/// ranks as the weakest. The intercept is excluded.
pub fn rank_coefficients(model: &FittedModel) -> CoefficientTable {
    let mut rows: Vec<RankedCoefficient> = model
        .terms
        .iter()
        .filter(|c| c.name != INTERCEPT)
        .map(|c| RankedCoefficient {
            name: c.name.clone(),
            coefficient: c.estimate,
            abs_t: c.t_statistic.abs(),
            p_value: c.p_value,
        })
        .collect();

    rows.sort_by(compare_strength);

    CoefficientTable { rows }
}

fn compare_strength(a: &RankedCoefficient, b: &RankedCoefficient) -> Ordering {
    let strength = |r: &RankedCoefficient| {
        if r.abs_t.is_nan() {
            f64::NEG_INFINITY
        } else {
            r.abs_t
        }
    };

    strength(b)
        .total_cmp(&strength(a))
        .then_with(|| a.p_value.total_cmp(&b.p_value))
        .then_with(|| a.name.cmp(&b.name))
}
