use thiserror::Error;

/// Errors that can occur during an analysis
#[derive(Error, Debug)]
pub enum StatsError {
    // Input validation errors
    #[error("Column '{column}' is constant and cannot be rescaled or analysed")]
    DegenerateColumn { column: String },

    #[error("Insufficient data: {rows} rows, {predictors} predictors (need rows > predictors + 1)")]
    InsufficientSamples { rows: usize, predictors: usize },

    #[error("Insufficient data: {0}")]
    InsufficientSamplesMsg(String),

    #[error("Target column '{0}' is not usable")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Column '{column}' contains missing or non-finite values")]
    MissingValues { column: String },

    #[error("Dimension mismatch: expected {expected} values, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Empty input: {field} cannot be empty")]
    EmptyInput { field: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Numerical errors
    #[error("Design matrix is singular: '{column}' is a linear combination of earlier columns")]
    SingularMatrix { column: String },

    #[error("Stepwise elimination failed with {feature_count} features remaining: {source}")]
    StepFailed {
        feature_count: usize,
        #[source]
        source: Box<StatsError>,
    },

    // Collaborator errors
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

/// Result type for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;
