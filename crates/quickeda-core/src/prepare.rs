//! Data preparation for multivariate analysis
//!
//! Categorical columns are expanded into indicator (dummy) columns with the
//! first lexical level dropped as reference, then every column is min-max
//! rescaled into [0, 1]:
//! ```text
//! x_scaled = (x - min(x)) / (max(x) - min(x))
//! ```

use crate::errors::{StatsError, StatsResult};
use crate::table::{ColumnKind, PreparedTable, RawTable, Value};
use crate::types::{DegeneratePolicy, PrepareOptions};
use std::collections::BTreeSet;

/// Encode and rescale a raw table
///
/// # Arguments
/// * `table` - Raw input table
/// * `numeric_only` - Drop the original categorical columns after encoding
pub fn prepare(table: &RawTable, numeric_only: bool) -> StatsResult<PreparedTable> {
    prepare_with(
        table,
        &PrepareOptions {
            numeric_only,
            ..Default::default()
        },
    )
}

/// Encode and rescale a raw table with explicit options
pub fn prepare_with(table: &RawTable, options: &PrepareOptions) -> StatsResult<PreparedTable> {
    let mut encoded: Vec<(String, Vec<f64>)> = Vec::with_capacity(table.n_cols());
    let mut indicators: Vec<(String, Vec<f64>)> = Vec::new();

    for (name, values) in table.columns() {
        match ColumnKind::of(values) {
            ColumnKind::Numeric => {
                let numeric = values
                    .iter()
                    .map(|v| v.as_number().unwrap_or(f64::NAN))
                    .collect();
                encoded.push((name.to_string(), numeric));
            }
            ColumnKind::Categorical => {
                let encoding = CategoricalEncoding::fit(values);
                if !options.numeric_only {
                    encoded.push((name.to_string(), encoding.codes(values)));
                }
                indicators.extend(encoding.indicators(name, values));
            }
        }
    }
    encoded.extend(indicators);

    let scaled = encoded
        .into_iter()
        .map(|(name, values)| {
            let values = min_max_scale(&name, &values, options.degenerate)?;
            Ok((name, values))
        })
        .collect::<StatsResult<Vec<_>>>()?;

    PreparedTable::with_rows(table.n_rows(), scaled)
}

/// Rescale one column into [0, 1]
///
/// Min and max are taken over finite values; non-finite cells stay NaN.
pub fn min_max_scale(
    name: &str,
    values: &[f64],
    policy: DegeneratePolicy,
) -> StatsResult<Vec<f64>> {
    let (min, max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    // Constant column or no finite values at all
    if max <= min {
        return match policy {
            DegeneratePolicy::Error => Err(StatsError::DegenerateColumn {
                column: name.to_string(),
            }),
            DegeneratePolicy::Zero => Ok(values
                .iter()
                .map(|v| if v.is_finite() { 0.0 } else { f64::NAN })
                .collect()),
        };
    }

    let range = max - min;
    Ok(values
        .iter()
        .map(|&v| if v.is_finite() { (v - min) / range } else { f64::NAN })
        .collect())
}

/// Sorted levels of a categorical column
struct CategoricalEncoding {
    levels: Vec<String>,
}

impl CategoricalEncoding {
    fn fit(values: &[Value]) -> Self {
        let levels: BTreeSet<String> = values
            .iter()
            .filter(|v| !v.is_missing())
            .map(ToString::to_string)
            .collect();
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    fn level_index(&self, value: &Value) -> Option<usize> {
        if value.is_missing() {
            return None;
        }
        let label = value.to_string();
        self.levels.binary_search(&label).ok()
    }

    /// Ordinal codes in level order, missing as NaN
    fn codes(&self, values: &[Value]) -> Vec<f64> {
        values
            .iter()
            .map(|v| self.level_index(v).map_or(f64::NAN, |i| i as f64))
            .collect()
    }

    /// One 0/1 column per level except the first (reference) level
    fn indicators(&self, name: &str, values: &[Value]) -> Vec<(String, Vec<f64>)> {
        let index: Vec<Option<usize>> = values.iter().map(|v| self.level_index(v)).collect();

        self.levels
            .iter()
            .enumerate()
            .skip(1)
            .map(|(level_idx, level)| {
                let column = index
                    .iter()
                    .map(|&i| if i == Some(level_idx) { 1.0 } else { 0.0 })
                    .collect();
                (format!("{name}_{level}"), column)
            })
            .collect()
    }
}
