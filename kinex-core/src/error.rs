//! Structured error types for the kinex workspace.

use thiserror::Error;

/// Unified error type for all kinex operations.
#[derive(Debug, Error)]
pub enum KinexError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed input data)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, mismatched dimensions, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An iterative fit stopped before reaching its tolerance
    #[error("no convergence: {0}")]
    Convergence(String),

    /// Singular design or information matrix
    #[error("singular matrix: {0}")]
    Singular(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the kinex workspace.
pub type Result<T> = std::result::Result<T, KinexError>;
