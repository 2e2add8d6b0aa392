use thiserror::Error;

/// Unified error type for `arellano` operations.
///
/// Only malformed inputs and broken internal contracts are errors. Running out
/// of iterations is reported through convergence flags on the solution types,
/// never raised here.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Raised when a model or solver parameter lies outside its admissible range.
    #[error("parameter `{name}` = {value} is invalid: {requirement}")]
    InvalidParameter {
        /// Field name as it appears on [`ModelConfig`](crate::config::ModelConfig).
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Human-readable admissible range.
        requirement: &'static str,
    },

    /// Raised when provided arrays or matrices have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension, often the model-implied value.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised when a transition matrix row does not sum to one.
    #[error("transition matrix row {row} sums to {sum}, expected 1")]
    NonStochasticRow { row: usize, sum: f64 },

    /// Raised when a grid that must be strictly increasing is not.
    #[error("{context} must be strictly increasing; violated at index {index}")]
    NonIncreasingGrid { context: &'static str, index: usize },

    /// Raised when an income realization is not strictly positive.
    #[error("income grid value at index {index} must be positive, found {value}")]
    NonPositiveIncome { index: usize, value: f64 },

    /// Raised when an internal invariant of the solver is violated.
    #[error("internal solver invariant violated during {context}")]
    InternalState { context: &'static str },
}

impl ModelError {
    /// Helper to format an [`InvalidParameter`](ModelError::InvalidParameter) error.
    pub fn invalid_parameter(name: &'static str, value: f64, requirement: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            requirement,
        }
    }

    /// Helper to format a [`DimensionMismatch`](ModelError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper for defensive checks on solver-internal contracts.
    pub fn internal(context: &'static str) -> Self {
        Self::InternalState { context }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, ModelError>;
