//! Feature-versus-label association analysis
//!
//! Numeric features are tested with Pearson's r, categorical features with
//! a one-way ANOVA of the label across the feature's groups. Group
//! comparisons add pairwise Student t-tests with a Bonferroni threshold.

use crate::diagnostics::{breusch_pagan, white_test, HeteroscedasticityResult};
use crate::errors::{StatsError, StatsResult};
use crate::models::fit_ols;
use crate::table::{ColumnKind, RawTable, Value};
use crate::tests::correlation::pearson;
use crate::tests::parametric::{one_way_anova, t_test, TTestOptions};
use crate::tests::AnovaResult;
use crate::types::{GroupTestOptions, OlsOptions};
use crate::univariate::skewness;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Test applied to one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum AssociationTest {
    PearsonR { r: f64, p_value: f64 },
    AnovaF { f: f64, p_value: f64 },
    /// The feature has missing cells and was not tested
    HasMissing,
    /// The test is undefined for this feature (e.g. a constant column)
    Untestable { reason: String },
}

/// Association of one feature with the label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRow {
    pub feature: String,
    pub test: AssociationTest,
}

impl AssociationRow {
    pub fn statistic(&self) -> Option<f64> {
        match self.test {
            AssociationTest::PearsonR { r, .. } => Some(r),
            AssociationTest::AnovaF { f, .. } => Some(f),
            AssociationTest::HasMissing | AssociationTest::Untestable { .. } => None,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        match self.test {
            AssociationTest::PearsonR { p_value, .. } | AssociationTest::AnovaF { p_value, .. } => {
                Some(p_value)
            }
            AssociationTest::HasMissing | AssociationTest::Untestable { .. } => None,
        }
    }

    /// Tested rows, then rows with missing cells, then untestable rows
    fn sort_group(&self) -> u8 {
        match self.test {
            AssociationTest::PearsonR { .. } | AssociationTest::AnovaF { .. } => 0,
            AssociationTest::HasMissing => 1,
            AssociationTest::Untestable { .. } => 2,
        }
    }
}

/// Associations sorted by |statistic| descending, untested rows last
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationTable {
    pub label: String,
    pub rows: Vec<AssociationRow>,
}

impl AssociationTable {
    pub fn get(&self, feature: &str) -> Option<&AssociationRow> {
        self.rows.iter().find(|r| r.feature == feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssociationRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Simple linear regression of a label on one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionStats {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value of the slope
    pub p_value: f64,
    pub feature_skew: Option<f64>,
    pub label_skew: Option<f64>,
}

/// Size and mean of the label within one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub n: usize,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseTest {
    pub group1: String,
    pub group2: String,
    pub t_statistic: f64,
    pub p_value: f64,
    /// p-value below the Bonferroni threshold
    pub significant: bool,
}

/// A pair of groups that could not be compared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedComparison {
    pub group1: String,
    pub group2: String,
    pub n1: usize,
    pub n2: usize,
    pub reason: String,
}

/// ANOVA plus pairwise t-tests of a label across the groups of a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Groups in first-seen order
    pub groups: Vec<GroupSummary>,
    pub anova: AnovaResult,
    pub pairwise: Vec<PairwiseTest>,
    pub skipped: Vec<SkippedComparison>,
    /// alpha divided by the number of pairwise tests performed
    pub bonferroni_threshold: f64,
}

/// Breusch-Pagan and, when it can be computed, White test results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeteroscedasticityReport {
    pub breusch_pagan: HeteroscedasticityResult,
    pub white: Option<HeteroscedasticityResult>,
}

impl HeteroscedasticityReport {
    pub fn iter(&self) -> impl Iterator<Item = &HeteroscedasticityResult> {
        std::iter::once(&self.breusch_pagan).chain(self.white.as_ref())
    }
}

/// Test every feature of `table` against a numeric `label`
pub fn bivariate_stats(table: &RawTable, label: &str) -> StatsResult<AssociationTable> {
    let y = label_values(table, label)?;
    if y.is_empty() {
        return Err(StatsError::EmptyInput { field: "table" });
    }
    if y.iter().any(|v| v.is_nan()) {
        return Err(StatsError::MissingValues {
            column: label.to_string(),
        });
    }
    if y.iter().all(|&v| v == y[0]) {
        return Err(StatsError::DegenerateColumn {
            column: label.to_string(),
        });
    }

    let mut rows = Vec::with_capacity(table.n_cols().saturating_sub(1));

    for (feature, values) in table.columns().filter(|(name, _)| *name != label) {
        let test = if values.iter().any(Value::is_missing) {
            AssociationTest::HasMissing
        } else {
            match association_test(table, feature, values, &y) {
                Ok(test) => test,
                Err(StatsError::DegenerateColumn { .. }) => untestable(feature, "constant feature"),
                Err(StatsError::InsufficientSamplesMsg(reason))
                | Err(StatsError::InvalidInput(reason)) => untestable(feature, &reason),
                Err(e) => return Err(e),
            }
        };

        debug!(feature, ?test, "association");
        rows.push(AssociationRow {
            feature: feature.to_string(),
            test,
        });
    }

    // |statistic| descending; stable, so untested rows keep table order at the end
    rows.sort_by(|a, b| {
        a.sort_group()
            .cmp(&b.sort_group())
            .then_with(|| match (a.statistic(), b.statistic()) {
                (Some(x), Some(y)) => y.abs().total_cmp(&x.abs()),
                _ => std::cmp::Ordering::Equal,
            })
    });

    Ok(AssociationTable {
        label: label.to_string(),
        rows,
    })
}

/// Least-squares line of `label` on `feature`
pub fn regression_stats(feature: &[f64], label: &[f64]) -> StatsResult<RegressionStats> {
    let fit = fit_ols(label, &[feature], &OlsOptions::default())?;

    if fit.sst == 0.0 {
        return Err(StatsError::InvalidInput(
            "regression is undefined for a constant label".into(),
        ));
    }

    Ok(RegressionStats {
        slope: fit.coefficients[1],
        intercept: fit.coefficients[0],
        r_squared: fit.r_squared,
        p_value: fit.p_values[1],
        feature_skew: skewness(feature),
        label_skew: skewness(label),
    })
}

/// Compare `label` across the groups of `feature`
///
/// Rows where either value is missing are ignored. Pairs with fewer than
/// two observations on a side, or with zero pooled variance, are skipped
/// and reported in [`GroupStats::skipped`].
pub fn group_stats(
    table: &RawTable,
    feature: &str,
    label: &str,
    options: &GroupTestOptions,
) -> StatsResult<GroupStats> {
    let keys = table
        .column(feature)
        .ok_or_else(|| StatsError::InvalidInput(format!("no column named '{feature}'")))?;
    let y = label_values(table, label)?;

    let (keys, y): (Vec<Value>, Vec<f64>) = keys
        .iter()
        .zip(&y)
        .filter(|(k, v)| !k.is_missing() && !v.is_nan())
        .map(|(k, v)| (k.clone(), *v))
        .unzip();

    let groups = group_label(&keys, &y);
    if groups.len() < 2 {
        return Err(StatsError::InsufficientSamplesMsg(format!(
            "'{feature}' has {} group(s); at least 2 are needed",
            groups.len()
        )));
    }

    let data: Vec<Vec<f64>> = groups.iter().map(|(_, g)| g.clone()).collect();
    let anova = one_way_anova(&data)?;

    let mut tests: Vec<(String, String, f64, f64)> = Vec::new();
    let mut skipped = Vec::new();

    for (i, (name1, data1)) in groups.iter().enumerate() {
        for (name2, data2) in groups.iter().skip(i + 1) {
            let (n1, n2) = (data1.len(), data2.len());

            let reason = if n1 < 2 || n2 < 2 {
                Some("not enough samples".to_string())
            } else {
                match t_test(data1, data2, &TTestOptions::default()) {
                    Ok(result) => {
                        tests.push((name1.clone(), name2.clone(), result.statistic, result.p_value));
                        None
                    }
                    Err(StatsError::InvalidInput(msg)) => Some(msg),
                    Err(e) => return Err(e),
                }
            };

            if let Some(reason) = reason {
                warn!(
                    feature,
                    group1 = %name1,
                    group2 = %name2,
                    n1,
                    n2,
                    %reason,
                    "pairwise comparison skipped"
                );
                skipped.push(SkippedComparison {
                    group1: name1.clone(),
                    group2: name2.clone(),
                    n1,
                    n2,
                    reason,
                });
            }
        }
    }

    let bonferroni_threshold = if tests.is_empty() {
        options.alpha
    } else {
        options.alpha / tests.len() as f64
    };

    let pairwise = tests
        .into_iter()
        .map(|(group1, group2, t_statistic, p_value)| PairwiseTest {
            group1,
            group2,
            t_statistic,
            p_value,
            significant: p_value < bonferroni_threshold,
        })
        .collect();

    let groups = groups
        .into_iter()
        .map(|(name, g)| GroupSummary {
            name,
            n: g.len(),
            mean: g.iter().sum::<f64>() / g.len() as f64,
        })
        .collect();

    Ok(GroupStats {
        groups,
        anova,
        pairwise,
        skipped,
        bonferroni_threshold,
    })
}

/// Breusch-Pagan and White tests on the regression of `label` on `feature`
///
/// Rows with a missing value in either column are dropped. A White test
/// that cannot be computed is logged and left out of the report.
pub fn check_heteroscedasticity(
    table: &RawTable,
    feature: &str,
    label: &str,
) -> StatsResult<HeteroscedasticityReport> {
    let x = table.numeric_column(feature)?;
    let y = label_values(table, label)?;

    let (x, y): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(&y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip();

    let fit = fit_ols(&y, &[&x], &OlsOptions::default())?;

    let breusch_pagan = breusch_pagan(&fit.residuals, &[&x])?;
    let white = match white_test(&fit.residuals, &[&x]) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(feature, label, error = %e, "unable to calculate White test");
            None
        }
    };

    Ok(HeteroscedasticityReport {
        breusch_pagan,
        white,
    })
}

/// Pearson r for numeric features, one-way ANOVA for categorical ones
fn association_test(
    table: &RawTable,
    feature: &str,
    values: &[Value],
    y: &[f64],
) -> StatsResult<AssociationTest> {
    match ColumnKind::of(values) {
        ColumnKind::Numeric => {
            let x = table.numeric_column(feature)?;
            if x.iter().all(|&v| v == x[0]) {
                return Err(StatsError::DegenerateColumn {
                    column: feature.to_string(),
                });
            }
            let result = pearson(&x, y)?;
            Ok(AssociationTest::PearsonR {
                r: result.r,
                p_value: result.p_value,
            })
        }
        ColumnKind::Categorical => {
            let data: Vec<Vec<f64>> = group_label(values, y).into_iter().map(|(_, g)| g).collect();
            let result = one_way_anova(&data)?;
            Ok(AssociationTest::AnovaF {
                f: result.f_statistic,
                p_value: result.p_value,
            })
        }
    }
}

fn untestable(feature: &str, reason: &str) -> AssociationTest {
    warn!(feature, reason, "association test undefined, feature left untested");
    AssociationTest::Untestable {
        reason: reason.to_string(),
    }
}

fn label_values(table: &RawTable, label: &str) -> StatsResult<Vec<f64>> {
    match table.kind(label) {
        Some(ColumnKind::Numeric) => table.numeric_column(label),
        _ => Err(StatsError::InvalidTarget(label.to_string())),
    }
}

/// Label values grouped by feature level, in first-seen order
fn group_label(keys: &[Value], y: &[f64]) -> Vec<(String, Vec<f64>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();

    for (key, &value) in keys.iter().zip(y) {
        let name = key.to_string();
        let slot = *index.entry(name.clone()).or_insert_with(|| {
            groups.push((name, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(value);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_table() -> RawTable {
        let y: [f64; 8] = [1.0, 2.1, 2.9, 4.2, 5.0, 5.8, 7.1, 8.0];
        let strong: Vec<Value> = y.iter().map(|v| Value::from(v * 2.0 + 1.0)).collect();
        let weak: Vec<Value> = [3.0_f64, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]
            .into_iter()
            .map(Value::from)
            .collect();
        let group: Vec<Value> = ["lo", "lo", "lo", "lo", "hi", "hi", "hi", "hi"]
            .into_iter()
            .map(Value::from)
            .collect();
        let gappy = vec![
            Value::from(1.0),
            Value::Missing,
            Value::from(3.0),
            Value::from(4.0),
            Value::from(5.0),
            Value::from(6.0),
            Value::from(7.0),
            Value::from(8.0),
        ];
        RawTable::new(vec![
            ("gappy", gappy),
            ("weak", weak),
            ("group", group),
            ("strong", strong),
            ("y", y.into_iter().map(Value::from).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn test_bivariate_sorted_by_strength() {
        let table = bivariate_stats(&mixed_table(), "y").unwrap();
        assert_eq!(table.len(), 4);

        let names: Vec<&str> = table.iter().map(|r| r.feature.as_str()).collect();
        // F of the two-group split is far above any |r|
        assert_eq!(names, vec!["group", "strong", "weak", "gappy"]);
        assert_eq!(table.get("gappy").unwrap().test, AssociationTest::HasMissing);

        match table.get("strong").unwrap().test {
            AssociationTest::PearsonR { r, p_value } => {
                assert!((r - 1.0).abs() < 1e-12);
                assert!(p_value < 1e-10);
            }
            ref other => panic!("expected Pearson r, got {other:?}"),
        }
        assert!(matches!(
            table.get("group").unwrap().test,
            AssociationTest::AnovaF { .. }
        ));
    }

    #[test]
    fn test_constant_feature_is_untestable() {
        let table = RawTable::from_numeric(vec![
            ("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            ("konst", vec![7.0; 6]),
            ("y", vec![1.2, 1.9, 3.1, 4.2, 4.8, 6.1]),
        ])
        .unwrap();

        let result = bivariate_stats(&table, "y").unwrap();
        let names: Vec<&str> = result.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names, vec!["x", "konst"]);
        assert!(matches!(
            result.get("konst").unwrap().test,
            AssociationTest::Untestable { .. }
        ));
        assert!(result.get("konst").unwrap().p_value().is_none());
    }

    #[test]
    fn test_all_singleton_groups_are_untestable() {
        let ids = ["id0", "id1", "id2", "id3", "id4", "id5"];
        let table = RawTable::new(vec![
            ("name", ids.into_iter().map(Value::from).collect()),
            ("x", [1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0].into_iter().map(Value::from).collect()),
            ("y", [1.2_f64, 1.9, 3.1, 4.2, 4.8, 6.1].into_iter().map(Value::from).collect()),
        ])
        .unwrap();

        let result = bivariate_stats(&table, "y").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0].feature, "x");
        match &result.get("name").unwrap().test {
            AssociationTest::Untestable { reason } => assert!(reason.contains("groups")),
            other => panic!("expected untestable row, got {other:?}"),
        }
    }

    #[test]
    fn test_untestable_rows_follow_missing_rows() {
        let table = RawTable::new(vec![
            ("konst", vec![Value::from(2.0); 5]),
            (
                "gappy",
                vec![
                    Value::from(1.0),
                    Value::Missing,
                    Value::from(3.0),
                    Value::from(2.0),
                    Value::from(5.0),
                ],
            ),
            ("x", [0.5_f64, 1.0, 1.5, 3.0, 2.0].into_iter().map(Value::from).collect()),
            ("y", [1.0_f64, 2.0, 3.0, 5.0, 4.0].into_iter().map(Value::from).collect()),
        ])
        .unwrap();

        let result = bivariate_stats(&table, "y").unwrap();
        let names: Vec<&str> = result.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names, vec!["x", "gappy", "konst"]);
    }

    #[test]
    fn test_bivariate_label_checks() {
        let table = mixed_table();
        assert!(matches!(
            bivariate_stats(&table, "group"),
            Err(StatsError::InvalidTarget(_))
        ));
        assert!(matches!(
            bivariate_stats(&table, "gappy"),
            Err(StatsError::MissingValues { .. })
        ));
        assert!(matches!(
            bivariate_stats(&table, "absent"),
            Err(StatsError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_regression_stats_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 5.0, 7.0, 9.0, 11.0];
        let stats = regression_stats(&x, &y).unwrap();
        assert!((stats.slope - 2.0).abs() < 1e-10);
        assert!((stats.intercept - 1.0).abs() < 1e-10);
        assert!((stats.r_squared - 1.0).abs() < 1e-12);
        assert!(stats.feature_skew.unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_regression_stats_matches_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let stats = regression_stats(&x, &y).unwrap();
        let corr = pearson(&x, &y).unwrap();
        assert!((stats.r_squared - corr.r * corr.r).abs() < 1e-10);
        assert!((stats.p_value - corr.p_value).abs() < 1e-8);
        assert!((stats.slope - 0.8).abs() < 1e-10);
    }

    #[test]
    fn test_group_stats_bonferroni_and_skips() {
        let keys = ["a", "a", "a", "b", "b", "b", "c", "d", "d"];
        let values: [f64; 9] = [1.0, 1.5, 2.0, 5.0, 5.5, 6.5, 3.0, 9.0, 9.5];
        let table = RawTable::new(vec![
            ("k", keys.into_iter().map(Value::from).collect()),
            ("v", values.into_iter().map(Value::from).collect()),
        ])
        .unwrap();

        let stats = group_stats(&table, "k", "v", &GroupTestOptions::default()).unwrap();

        let names: Vec<&str> = stats.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        // c is a singleton: a-c, b-c, c-d are skipped
        assert_eq!(stats.skipped.len(), 3);
        assert!(stats.skipped.iter().all(|s| s.group1 == "c" || s.group2 == "c"));
        assert_eq!(stats.pairwise.len(), 3);
        assert!((stats.bonferroni_threshold - 0.05 / 3.0).abs() < 1e-15);

        for test in &stats.pairwise {
            assert_eq!(test.significant, test.p_value < stats.bonferroni_threshold);
        }
        let ab = &stats.pairwise[0];
        assert_eq!((ab.group1.as_str(), ab.group2.as_str()), ("a", "b"));
        assert!(ab.t_statistic < 0.0);
    }

    #[test]
    fn test_group_stats_zero_variance_pair_skipped() {
        let keys = ["a", "a", "b", "b", "c", "c"];
        let values: [f64; 6] = [1.0, 1.0, 2.0, 2.0, 3.0, 4.0];
        let table = RawTable::new(vec![
            ("k", keys.into_iter().map(Value::from).collect()),
            ("v", values.into_iter().map(Value::from).collect()),
        ])
        .unwrap();

        let stats = group_stats(&table, "k", "v", &GroupTestOptions::default()).unwrap();
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].group1, "a");
        assert_eq!(stats.skipped[0].group2, "b");
        assert_eq!(stats.pairwise.len(), 2);
    }

    #[test]
    fn test_group_stats_single_group() {
        let table = RawTable::new(vec![
            ("k", vec![Value::from("a"), Value::from("a"), Value::from("a")]),
            ("v", vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]),
        ])
        .unwrap();
        assert!(matches!(
            group_stats(&table, "k", "v", &GroupTestOptions::default()),
            Err(StatsError::InsufficientSamplesMsg(_))
        ));
    }

    #[test]
    fn test_heteroscedasticity_report() {
        let x: Vec<f64> = (1..=40).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, xi)| 2.0 * xi + if i % 2 == 0 { xi * 0.5 } else { -xi * 0.5 })
            .collect();
        let table = RawTable::from_numeric(vec![("x", x), ("y", y)]).unwrap();

        let report = check_heteroscedasticity(&table, "x", "y").unwrap();
        assert!(report.breusch_pagan.lm_pvalue < 0.01);
        assert!(report.white.is_some());
        assert_eq!(report.iter().count(), 2);
    }
}
