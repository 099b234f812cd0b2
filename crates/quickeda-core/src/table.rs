//! In-memory tables
//!
//! A [`RawTable`] holds mixed-type cells as supplied by the caller. A
//! [`PreparedTable`] holds purely numeric columns produced by
//! [`crate::prepare::prepare`]. Neither is mutated after construction; the
//! selection helpers return new tables.

use crate::errors::{StatsError, StatsResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single cell of a raw table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Numeric content, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Missing cells and NaN numbers both count as missing
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(v) => v.is_nan(),
            Value::Text(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Missing => f.write_str("NA"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Semantic type of a raw column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Every non-missing cell is a number
    Numeric,
    /// At least one cell is text
    Categorical,
}

impl ColumnKind {
    pub fn of(values: &[Value]) -> Self {
        if values.iter().any(|v| matches!(v, Value::Text(_))) {
            ColumnKind::Categorical
        } else {
            ColumnKind::Numeric
        }
    }
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>) -> StatsResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(StatsError::InvalidInput(format!(
                "duplicate column name '{name}'"
            )));
        }
    }
    Ok(())
}

/// Ordered, named columns of mixed-type values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    n_rows: usize,
}

impl RawTable {
    /// Build a table, checking that every column has the same length and
    /// that names are unique.
    pub fn new<N: Into<String>>(columns: Vec<(N, Vec<Value>)>) -> StatsResult<Self> {
        let (names, columns): (Vec<String>, Vec<Vec<Value>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();

        check_unique(names.iter().map(String::as_str))?;

        let n_rows = columns.first().map_or(0, Vec::len);
        for values in &columns {
            if values.len() != n_rows {
                return Err(StatsError::DimensionMismatch {
                    expected: n_rows,
                    got: values.len(),
                });
            }
        }

        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Convenience constructor for all-numeric data
    pub fn from_numeric<N: Into<String>>(columns: Vec<(N, Vec<f64>)>) -> StatsResult<Self> {
        Self::new(
            columns
                .into_iter()
                .map(|(name, values)| (name, values.into_iter().map(Value::Number).collect()))
                .collect(),
        )
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Iterate over `(name, values)` pairs in table order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(ColumnKind::of)
    }

    /// Extract a numeric column, with missing cells as NaN
    pub fn numeric_column(&self, name: &str) -> StatsResult<Vec<f64>> {
        let values = self
            .column(name)
            .ok_or_else(|| StatsError::InvalidInput(format!("no column named '{name}'")))?;

        values
            .iter()
            .map(|v| match v {
                Value::Number(x) => Ok(*x),
                Value::Missing => Ok(f64::NAN),
                Value::Text(_) => Err(StatsError::InvalidInput(format!(
                    "column '{name}' is not numeric"
                ))),
            })
            .collect()
    }
}

/// Ordered, named, purely numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl PreparedTable {
    /// Build a table whose row count is that of its first column
    pub fn new<N: Into<String>>(columns: Vec<(N, Vec<f64>)>) -> StatsResult<Self> {
        let n_rows = columns.first().map_or(0, |(_, values)| values.len());
        Self::with_rows(n_rows, columns)
    }

    /// Build a table with an explicit row count, which survives even when
    /// `columns` is empty
    pub fn with_rows<N: Into<String>>(
        n_rows: usize,
        columns: Vec<(N, Vec<f64>)>,
    ) -> StatsResult<Self> {
        let (names, columns): (Vec<String>, Vec<Vec<f64>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();

        check_unique(names.iter().map(String::as_str))?;

        for values in &columns {
            if values.len() != n_rows {
                return Err(StatsError::DimensionMismatch {
                    expected: n_rows,
                    got: values.len(),
                });
            }
        }

        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// New table restricted to `names`, in the order given
    pub fn select(&self, names: &[&str]) -> StatsResult<PreparedTable> {
        let columns = names
            .iter()
            .map(|&name| {
                self.column(name)
                    .map(|values| (name.to_string(), values.to_vec()))
                    .ok_or_else(|| StatsError::InvalidInput(format!("no column named '{name}'")))
            })
            .collect::<StatsResult<Vec<_>>>()?;
        PreparedTable::with_rows(self.n_rows, columns)
    }

    /// New table without the named column
    pub fn without(&self, name: &str) -> StatsResult<PreparedTable> {
        if !self.contains(name) {
            return Err(StatsError::InvalidInput(format!("no column named '{name}'")));
        }
        let keep: Vec<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|&n| n != name)
            .collect();
        self.select(&keep)
    }
}

impl From<&PreparedTable> for RawTable {
    fn from(table: &PreparedTable) -> Self {
        RawTable {
            names: table.names.clone(),
            columns: table
                .columns
                .iter()
                .map(|col| col.iter().map(|&v| Value::Number(v)).collect())
                .collect(),
            n_rows: table.n_rows,
        }
    }
}
