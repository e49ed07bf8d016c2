use thiserror::Error;

/// Error types for the curvefit library.
///
/// Only arithmetic impossibilities and malformed inputs are errors; a
/// degraded-but-computable condition (near-singular system, nothing left to
/// fit) is reported as a status value alongside the result instead.
#[derive(Error, Debug)]
pub enum FitError {
    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A measurement uncertainty of zero would divide chi-squared by zero.
    #[error("errors cannot be zero")]
    ZeroUncertainty,

    /// Error during model function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for curvefit operations.
pub type Result<T> = std::result::Result<T, FitError>;

/// Extensions for converting from other error types.
impl From<String> for FitError {
    fn from(s: String) -> Self {
        FitError::Other(s)
    }
}

impl From<&str> for FitError {
    fn from(s: &str) -> Self {
        FitError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FitError::DimensionMismatch("expected 3x3, got 2x2".to_string());
        assert!(format!("{}", err).contains("expected 3x3, got 2x2"));

        let err = FitError::ZeroUncertainty;
        assert_eq!(format!("{}", err), "errors cannot be zero");
    }

    #[test]
    fn test_error_conversion() {
        let str_err: FitError = "test error".into();
        match str_err {
            FitError::Other(s) => assert_eq!(s, "test error"),
            _ => panic!("Expected Other variant"),
        }
    }
}
