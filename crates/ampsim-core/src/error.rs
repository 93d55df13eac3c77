//! Error types shared across the ampsim crates.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A stamp referenced a matrix position that was never registered.
    #[error("unregistered matrix entry ({row}, {col})")]
    InvalidPattern { row: String, col: String },

    /// A name lookup failed against the frozen node directory.
    #[error("unknown node: {0}")]
    NodeNotFound(String),

    /// The linear solve failed for the current Jacobian.
    #[error("singular Jacobian")]
    SingularJacobian,

    /// Newton-Raphson hit the iteration limit without converging.
    #[error("no convergence after {0} Newton iterations")]
    NotConverged(usize),

    /// `advance` was called with a non-positive or non-finite step.
    #[error("invalid timestep: {0}")]
    InvalidTimestep(f64),

    /// No control parameter was registered under this name.
    #[error("unknown parameter: {0}")]
    ParamNotFound(String),

    /// No input signal was registered under this name.
    #[error("unknown input: {0}")]
    InputNotFound(String),

    /// The linear solver rejected the system.
    #[error("linear solver: {0}")]
    Solver(String),
}

pub type Result<T> = std::result::Result<T, Error>;
