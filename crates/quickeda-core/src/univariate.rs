//! Per-column descriptive statistics
//!
//! Every column gets count, missing, unique and mode. Numeric columns also
//! get quantiles (linear interpolation), mean, sample standard deviation,
//! adjusted skewness and bias-corrected excess kurtosis.

use crate::errors::{StatsError, StatsResult};
use crate::table::{ColumnKind, RawTable, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Distribution summary of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation, needs 2 values
    pub std: Option<f64>,
    /// Adjusted Fisher-Pearson skewness, needs 3 values
    pub skew: Option<f64>,
    /// Excess kurtosis, needs 4 values
    pub kurt: Option<f64>,
}

/// Type-specific part of a column summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "profile", rename_all = "snake_case")]
pub enum ColumnProfile {
    Numeric(NumericSummary),
    NonNumeric,
    /// No non-missing values to describe
    Empty,
}

/// Univariate statistics of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Non-missing cells
    pub count: usize,
    pub missing: usize,
    /// Distinct non-missing values
    pub unique: usize,
    pub kind: ColumnKind,
    /// Most frequent value; the smallest one wins ties
    pub mode: Option<Value>,
    pub profile: ColumnProfile,
}

impl ColumnSummary {
    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    pub fn numeric(&self) -> Option<&NumericSummary> {
        match &self.profile {
            ColumnProfile::Numeric(summary) => Some(summary),
            _ => None,
        }
    }

    fn sort_value(&self, key: SortKey) -> Option<f64> {
        match key {
            SortKey::Missing => Some(self.missing as f64),
            SortKey::Unique => Some(self.unique as f64),
            SortKey::Skew => self.numeric().and_then(|s| s.skew),
            SortKey::Kurt => self.numeric().and_then(|s| s.kurt),
            SortKey::Std => self.numeric().and_then(|s| s.std),
        }
    }
}

/// Column used to order a univariate table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Skew,
    Kurt,
    /// Sorted descending
    Missing,
    Unique,
    Std,
}

impl FromStr for SortKey {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skew" => Ok(SortKey::Skew),
            "kurt" => Ok(SortKey::Kurt),
            "missing" => Ok(SortKey::Missing),
            "unique" => Ok(SortKey::Unique),
            "std" => Ok(SortKey::Std),
            other => Err(StatsError::Configuration(format!(
                "unknown sort key '{other}' (expected skew, kurt, missing, unique or std)"
            ))),
        }
    }
}

/// Column summaries in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnivariateTable {
    pub rows: Vec<ColumnSummary>,
}

impl UnivariateTable {
    pub fn get(&self, name: &str) -> Option<&ColumnSummary> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSummary> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Univariate statistics split by column kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnivariateSplit {
    pub numeric: UnivariateTable,
    pub non_numeric: UnivariateTable,
}

/// Summarize every column of `table`
///
/// Numeric columns come first. Within each kind rows are ordered by
/// `sort_by`, ascending except for `Missing`. Rows lacking the key (e.g.
/// skewness of a text column) follow the keyed rows in table order.
pub fn univariate_stats(table: &RawTable, sort_by: SortKey) -> StatsResult<UnivariateTable> {
    let mut rows: Vec<ColumnSummary> = table
        .columns()
        .map(|(name, values)| summarize_column(name, values))
        .collect();

    rows.sort_by(|a, b| {
        b.is_numeric()
            .cmp(&a.is_numeric())
            .then_with(|| compare_keys(a.sort_value(sort_by), b.sort_value(sort_by), sort_by))
    });

    Ok(UnivariateTable { rows })
}

/// Univariate statistics with the default ordering, split by kind
pub fn split_univariate_stats(table: &RawTable) -> StatsResult<UnivariateSplit> {
    let stats = univariate_stats(table, SortKey::default())?;
    let (numeric, non_numeric): (Vec<_>, Vec<_>) =
        stats.rows.into_iter().partition(ColumnSummary::is_numeric);

    Ok(UnivariateSplit {
        numeric: UnivariateTable { rows: numeric },
        non_numeric: UnivariateTable { rows: non_numeric },
    })
}

fn compare_keys(a: Option<f64>, b: Option<f64>, key: SortKey) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if key == SortKey::Missing => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn summarize_column(name: &str, values: &[Value]) -> ColumnSummary {
    let kind = ColumnKind::of(values);
    let present: Vec<&Value> = values.iter().filter(|v| !v.is_missing()).collect();

    let mut frequencies: BTreeMap<Level<'_>, usize> = BTreeMap::new();
    for v in &present {
        if let Some(level) = Level::of(v) {
            *frequencies.entry(level).or_insert(0) += 1;
        }
    }

    // Ascending iteration with a strict comparison keeps the smallest tied level
    let mode = frequencies
        .iter()
        .fold(None, |best: Option<(&Level<'_>, usize)>, (level, &count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((level, count)),
        })
        .map(|(level, _)| level.to_value());

    let profile = if present.is_empty() {
        ColumnProfile::Empty
    } else {
        match kind {
            ColumnKind::Numeric => {
                let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_number()).collect();
                ColumnProfile::Numeric(numeric_summary(&numbers))
            }
            ColumnKind::Categorical => ColumnProfile::NonNumeric,
        }
    };

    ColumnSummary {
        name: name.to_string(),
        count: present.len(),
        missing: values.len() - present.len(),
        unique: frequencies.len(),
        kind,
        mode,
        profile,
    }
}

/// Summary of a non-empty slice of finite-or-infinite numbers
fn numeric_summary(values: &[f64]) -> NumericSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    NumericSummary {
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        mean: values.iter().sum::<f64>() / values.len() as f64,
        std: sample_std(values),
        skew: skewness(values),
        kurt: excess_kurtosis(values),
    }
}

/// Linear-interpolated quantile of sorted data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Central moment sums (Σd², Σd³, Σd⁴) about the mean
fn moment_sums(values: &[f64]) -> (f64, f64, f64) {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), x| {
        let d = x - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    })
}

fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let (m2, _, _) = moment_sums(values);
    Some((m2 / (n - 1) as f64).sqrt())
}

/// G1 = g1 * sqrt(n(n-1)) / (n-2)
pub(crate) fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (m2, m3, _) = moment_sums(values);
    if m2 == 0.0 {
        return Some(0.0);
    }
    let nf = n as f64;
    let g1 = (m3 / nf) / (m2 / nf).powf(1.5);
    Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
}

/// G2 = ((n+1) g2 + 6) (n-1) / ((n-2)(n-3))
fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (m2, _, m4) = moment_sums(values);
    if m2 == 0.0 {
        return Some(0.0);
    }
    let nf = n as f64;
    let g2 = nf * m4 / (m2 * m2) - 3.0;
    Some(((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0)))
}

/// Orderable view of a non-missing cell; numbers sort before text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level<'a> {
    Number(OrderedFloat),
    Text(&'a str),
}

impl<'a> Level<'a> {
    fn of(value: &'a Value) -> Option<Self> {
        match value {
            Value::Number(v) if !v.is_nan() => Some(Level::Number(OrderedFloat::new(*v))),
            Value::Text(s) => Some(Level::Text(s)),
            _ => None,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Level::Number(v) => Value::Number(v.0),
            Level::Text(s) => Value::Text(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OrderedFloat(f64);

impl OrderedFloat {
    /// -0.0 and 0.0 are the same level
    fn new(v: f64) -> Self {
        OrderedFloat(if v == 0.0 { 0.0 } else { v })
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn quantiles_are_ordered(values in proptest::collection::vec(-1e6_f64..1e6, 1..50)) {
            let table = RawTable::from_numeric(vec![("x", values)]).unwrap();
            let stats = univariate_stats(&table, SortKey::Skew).unwrap();
            let s = stats.get("x").unwrap().numeric().unwrap();
            prop_assert!(s.min <= s.q25 && s.q25 <= s.median);
            prop_assert!(s.median <= s.q75 && s.q75 <= s.max);
            prop_assert!(s.mean >= s.min - 1e-6 && s.mean <= s.max + 1e-6);
        }
    }
}
