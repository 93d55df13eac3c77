//! Core data structures for the ampsim real-time circuit simulator.
//!
//! This crate provides the pieces every other ampsim crate builds on:
//!
//! - [`EntryTable`](table::EntryTable) - interned node directory and
//!   sparsity registry, frozen into a CSR pattern at build time
//! - [`SparseSystem`](system::SparseSystem) - the layered MNA value
//!   buffers, solution/state vectors and typed stamp handles
//! - [`Component`](component::Component) - the stamp protocol every
//!   device implements
//! - [`Signal`](signal::Signal) - lock-free scalars shared between the
//!   audio thread and a control thread
//!
//! # Modified Nodal Analysis
//!
//! The simulator assembles a square system `A x = b` whose unknowns are
//! node voltages plus one branch current per voltage-defining element.
//! Devices contribute additive *stamps* into shared sparse storage; the
//! storage is split into a static, a dynamic and a nonlinear layer so
//! that each class of contribution is recomputed only when needed.
//!
//! # Example: registering and resolving a pattern
//!
//! ```rust
//! use ampsim_core::table::EntryTable;
//!
//! let mut table = EntryTable::new();
//! table.register_node("0"); // ground is never allocated a row
//! table.register_node("1");
//! table.register_node("2");
//! table.register_entry("1", "1");
//! table.register_entry("1", "2");
//! table.register_entry("2", "2");
//! table.freeze().unwrap();
//!
//! assert_eq!(table.num_nodes(), 2);
//! assert_eq!(table.num_entries(), 3);
//! assert!(table.node_index("0").is_none());
//! ```

pub mod component;
pub mod error;
pub mod node;
pub mod signal;
pub mod system;
pub mod table;
pub mod units;

pub use component::{Classification, Component};
pub use error::{Error, Result};
pub use signal::{Signal, SignalBank};
pub use system::{Layer, MatrixEntry, RhsEntry, SolutionRef, SparseSystem, StateRef};
pub use table::EntryTable;
