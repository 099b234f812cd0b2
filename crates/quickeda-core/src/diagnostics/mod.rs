//! Diagnostic functions for regression models

mod coefficients;
mod heteroscedasticity;
mod metrics;
mod vif;

pub use coefficients::rank_coefficients;
pub use heteroscedasticity::{
    breusch_pagan, white_test, HeteroscedasticityResult, HeteroscedasticityTest,
};
pub use metrics::compute_metrics;
pub use vif::compute_vif;
