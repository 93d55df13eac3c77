//! Solvers and the simulation driver for ampsim.
//!
//! This crate hosts everything that happens after a circuit's sparsity
//! pattern is frozen:
//!
//! - [`LinearSolver`] - the pluggable direct-solve boundary, with a
//!   dense LU for small systems and a native sparse LU for larger ones
//! - [`amd`] - fill-reducing minimum-degree ordering applied to the
//!   pattern at build time
//! - [`newton`] - the Newton-Raphson fixed-point iteration over the
//!   nonlinear layer
//! - [`Circuit`] - the driver that owns the system, partitions the
//!   components and advances simulated time one sample at a time
//!
//! # Example
//!
//! ```rust
//! use ampsim_core::Component;
//! use ampsim_devices::{CurrentSource, Resistor};
//! use ampsim_solver::Circuit;
//!
//! let components: Vec<Box<dyn Component>> = vec![
//!     Box::new(CurrentSource::dc("I1", "0", "1", 1e-3)),
//!     Box::new(Resistor::new("R1", "1", "0", 1e3)),
//! ];
//! let mut circuit = Circuit::build(components).unwrap();
//! let iterations = circuit.advance(1e-5).unwrap();
//! assert!(iterations > 0);
//! assert!((circuit.solution("1").unwrap() - 1.0).abs() < 1e-9);
//! ```

pub mod amd;
pub mod engine;
pub mod error;
pub mod linear;
pub mod newton;
pub mod sparse_lu;

pub use engine::Circuit;
pub use error::SolverError;
pub use linear::{default_solver, DenseLu, LinearSolver, DENSE_CUTOFF};
pub use newton::NewtonSettings;
pub use sparse_lu::SparseLu;
