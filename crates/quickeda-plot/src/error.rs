use quickeda_core::StatsError;
use thiserror::Error;

/// Errors raised by the rendering backends
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Unsupported plot backend '{0}' (expected 'svg' or 'json')")]
    UnsupportedBackend(String),

    #[error("Nothing to draw: {0}")]
    EmptyChart(String),

    #[error("Drawing failed: {0}")]
    Drawing(String),

    #[error("Chart serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<PlotError> for StatsError {
    fn from(e: PlotError) -> Self {
        StatsError::Render(e.to_string())
    }
}

/// Adapter for plotters' drawing-area errors
pub(crate) fn drawing<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Drawing(e.to_string())
}
