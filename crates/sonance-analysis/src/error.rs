//! Error types for spectral analysis operations.

use thiserror::Error;

/// Errors reported by the analysis engine.
///
/// Every operation in this crate is a pure, deterministic computation, so none of
/// these are retryable without changing the input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Array has the wrong dimensionality or inconsistent dimensions.
    #[error("invalid shape: expected {expected}, got {actual}")]
    InvalidShape {
        /// Description of the shape the operation needs.
        expected: String,
        /// Description of the shape it was given.
        actual: String,
    },

    /// Zero (or non-finite) power where a division by that power is required.
    #[error("degenerate spectrum: {0}")]
    DegenerateSpectrum(String),

    /// Window, step, or transform length is not usable.
    #[error("invalid window configuration: {0}")]
    InvalidWindowConfig(String),

    /// A numeric parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The singular value decomposition did not converge.
    #[error("singular value decomposition did not converge for a {rows}x{cols} matrix")]
    DecompositionFailed {
        /// Rows of the input matrix.
        rows: usize,
        /// Columns of the input matrix.
        cols: usize,
    },
}

impl Error {
    /// Create a shape error from anything displayable.
    pub fn invalid_shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::InvalidShape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Convenience result type for analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_shape_display() {
        let err = Error::invalid_shape("1-D signal", "2-D array [4, 4]");
        assert_eq!(
            err.to_string(),
            "invalid shape: expected 1-D signal, got 2-D array [4, 4]"
        );
    }

    #[test]
    fn degenerate_spectrum_display() {
        let err = Error::DegenerateSpectrum("bin 3 has zero power".to_string());
        assert!(err.to_string().contains("bin 3"));
    }

    #[test]
    fn decomposition_failed_display() {
        let err = Error::DecompositionFailed { rows: 3, cols: 8 };
        assert!(err.to_string().contains("3x8"), "got: {err}");
    }
}
