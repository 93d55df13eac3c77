//! Error types for the linear-solver boundary.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SolverError {
    /// The CSR arrays do not describe a square system of the announced
    /// size.
    #[error("invalid system: {0}")]
    InvalidSystem(String),

    /// A pivot fell below the numerical threshold.
    #[error("numerically singular matrix at pivot {0}")]
    Singular(usize),

    /// `solve` was called before a successful `factor`.
    #[error("matrix was not factored before solve")]
    NotFactored,
}
