//! Variance Inflation Factor (VIF) computation

use crate::errors::{StatsError, StatsResult};
use crate::models::fit_named;
use crate::table::PreparedTable;
use crate::types::{OlsOptions, VifEntry, VifTable};
use tracing::debug;

/// Tolerances at or below this are treated as perfect collinearity
const TOLERANCE_FLOOR: f64 = 1e-10;

/// Variance inflation factor of every predictor in `table`.
///
/// Each predictor is regressed on the remaining ones with an intercept;
/// tolerance = 1 - R² of that fit and VIF = 1 / tolerance. Values above 5
/// (loosely) or 10 (strictly) flag problematic collinearity.
///
/// `target`, when given, is left out of the predictor set. The result is
/// sorted ascending by VIF.
pub fn compute_vif(table: &PreparedTable, target: Option<&str>) -> StatsResult<VifTable> {
    if let Some(t) = target {
        if !table.contains(t) {
            return Err(StatsError::InvalidTarget(t.to_string()));
        }
    }

    let candidates: Vec<(&str, &[f64])> = table
        .columns()
        .filter(|(name, _)| Some(*name) != target)
        .collect();

    if candidates.is_empty() {
        return Err(StatsError::InvalidInput(
            "VIF requires at least one predictor".into(),
        ));
    }

    if candidates.len() == 1 {
        // Nothing to regress on
        return Ok(VifTable {
            entries: vec![VifEntry {
                predictor: candidates[0].0.to_string(),
                vif: 1.0,
                tolerance: 1.0,
            }],
        });
    }

    let options = OlsOptions {
        fit_intercept: true,
        compute_inference: false,
    };

    let mut entries = Vec::with_capacity(candidates.len());

    for (j, &(name, y)) in candidates.iter().enumerate() {
        let (other_names, other_x): (Vec<&str>, Vec<&[f64]>) = candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != j)
            .map(|(_, &(n, col))| (n, col))
            .unzip();

        // predictor_j ~ other predictors
        let tolerance = match fit_named(name, y, &other_names, &other_x, &options) {
            // A constant predictor is fully explained by the intercept
            Ok(fit) if fit.sst == 0.0 => 0.0,
            Ok(fit) => (1.0 - fit.r_squared).clamp(0.0, 1.0),
            Err(StatsError::SingularMatrix { column }) => {
                debug!(predictor = name, %column, "auxiliary design singular, VIF saturates");
                0.0
            }
            Err(e) => return Err(e),
        };

        let vif = vif_from_tolerance(tolerance);
        if vif.is_infinite() {
            debug!(predictor = name, "perfect collinearity");
        }

        entries.push(VifEntry {
            predictor: name.to_string(),
            vif,
            tolerance,
        });
    }

    entries.sort_by(|a, b| a.vif.total_cmp(&b.vif));

    Ok(VifTable { entries })
}

fn vif_from_tolerance(tolerance: f64) -> f64 {
    if tolerance <= TOLERANCE_FLOOR {
        f64::INFINITY
    } else {
        1.0 / tolerance
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn vif_at_least_one_and_sorted(
            cols in proptest::collection::vec(
                proptest::collection::vec(0.0_f64..1.0, 12..=12), 2..=4)
        ) {
            let columns: Vec<(String, Vec<f64>)> = cols
                .into_iter()
                .enumerate()
                .map(|(i, c)| (format!("x{i}"), c))
                .collect();
            let table = PreparedTable::new(columns).unwrap();

            let result = compute_vif(&table, None).unwrap();
            prop_assert!(result.iter().all(|e| e.vif >= 1.0));
            prop_assert!(result.entries.windows(2).all(|w| w[0].vif <= w[1].vif));
        }
    }
}
