//! Regression model implementations

mod ols;

pub(crate) use ols::{fit_named, two_sided_p_values};
pub use ols::{fit_linear_model, fit_ols, OlsFit};
