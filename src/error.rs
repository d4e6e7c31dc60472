use thiserror::Error;

/// Unified error type for `ottrs` operations.
#[derive(Debug, Error)]
pub enum OtError {
    /// Raised when provided arrays or matrices have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required dimension, often implied by the geometry.
        expected: usize,
        /// The dimension that was actually supplied.
        found: usize,
    },

    /// Raised when the entropic regularization strength is not a positive real.
    #[error("regularization strength must be positive, found {value}")]
    NonPositiveRegularization { value: f64 },

    /// Raised when an iteration budget of zero is requested.
    #[error("iteration count must be at least one")]
    ZeroIterations,

    /// Raised when kernel-mode scaling under- or overflows. Log-domain mode
    /// (`lse_mode`) does not hit this path.
    #[error("encountered non-finite value during {context}")]
    NumericalError { context: &'static str },

    /// Raised when a contract step is invoked before its prerequisite.
    #[error("{component} must be provided before this call")]
    MissingComponent { component: &'static str },
}

impl OtError {
    /// Helper to format a [`DimensionMismatch`](OtError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper for bubbling up missing prerequisites from the benchmark contract.
    pub fn missing_component(component: &'static str) -> Self {
        Self::MissingComponent { component }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, OtError>;
