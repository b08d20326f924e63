use thiserror::Error;

/// Enum of the possible error variants that may be encountered while rotating a field series
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotationError {
    /// Too few samples remain after `start_index` for a stable median
    #[error("insufficient data: {available} usable samples, at least {required} required")]
    InsufficientData { available: usize, required: usize },

    /// The inclination equation has no real solution for this data and station
    #[error("cannot solve for inclination: arccos argument {argument} is outside [-1, 1]")]
    InclinationSolve { argument: f64 },

    /// A caller-supplied parameter is out of range
    #[error("{0}")]
    InvalidParameter(String),
}
