//! Error types for the unfolding toolkit

use thiserror::Error;

/// Unfolding error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration (bin count out of bounds, zero dimensionality, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input data (empty or mismatched sample sets, malformed file)
    #[error("Input error: {0}")]
    Input(String),

    /// A lookup value falls outside the binned domain
    #[error("Range error: {0}")]
    Range(String),

    /// Numerical failure (singular matrix, SVD non-convergence)
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
