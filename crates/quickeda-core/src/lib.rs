//! quickeda-core: exploratory data analysis on in-memory tables
//!
//! This crate provides per-column profiling, feature/label association
//! tests and multivariate regression diagnostics (OLS, VIF, coefficient
//! ranking and backward stepwise elimination). Chart rendering is delegated
//! to a [`ChartRenderer`] implementation.

pub mod analyzer;
pub mod bivariate;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod prepare;
pub mod render;
pub mod stepwise;
pub mod table;
pub mod tests;
pub mod types;
pub mod univariate;

pub use analyzer::{BivariateReport, DataAnalyzer, MultivariateMethod, MultivariateReport};
pub use errors::{StatsError, StatsResult};
pub use prepare::{prepare, prepare_with};
pub use render::{BarChart, ChartRenderer, ScatterChart};
pub use stepwise::{stepwise_eliminate, stepwise_eliminate_with};
pub use table::{ColumnKind, PreparedTable, RawTable, Value};
pub use types::*;
