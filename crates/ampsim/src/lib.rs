//! # ampsim
//!
//! A real-time SPICE-style circuit simulator for audio processing.
//!
//! ampsim assembles a Modified Nodal Analysis system from an ordered
//! list of component stamps and solves it once per audio sample. The
//! assembly is layered - static, dynamic (time-step) and nonlinear
//! (Newton iteration) contributions live in separate shadows of the
//! same sparse pattern - so each class of work is redone only when it
//! has to be.
//!
//! ## Quick start
//!
//! ```rust
//! use ampsim::prelude::*;
//!
//! // a 1 V source across a two-resistor divider
//! let components: Vec<Box<dyn Component>> = vec![
//!     Box::new(VoltageSource::dc("V1", "1", "0", 1.0)),
//!     Box::new(Resistor::new("R1", "1", "2", 1.0)),
//!     Box::new(Resistor::new("R2", "2", "0", 1.0)),
//! ];
//!
//! let mut circuit = Circuit::build(components).unwrap();
//! assert!(circuit.advance(1.0 / 48_000.0).unwrap() > 0);
//! assert!((circuit.solution("2").unwrap() - 0.5).abs() < 1e-9);
//! ```
//!
//! ## Feeding audio
//!
//! Sources built from [`Waveform::input`] read a lock-free scalar the
//! host writes before each [`Circuit::advance`]; output nodes are read
//! back through [`Circuit::x_handle`]. Control knobs (for example a
//! [`Potentiometer`] position) work the same way via
//! [`Circuit::param`].

pub use ampsim_core as core;
pub use ampsim_devices as devices;
pub use ampsim_solver as solver;

pub use ampsim_core::{
    Classification, Component, EntryTable, Error, Layer, Result, Signal, SignalBank,
    SparseSystem,
};

pub use ampsim_devices::{
    Bjt, BjtParams, BjtType, Capacitor, Cccs, Ccvs, CurrentSource, Diode, Inductor, IvCurve,
    NonlinearResistor, OpAmp, Potentiometer, Resistor, Shockley, Vccs, Vcvs, VoltageSource,
    Waveform,
};

pub use ampsim_solver::{
    default_solver, Circuit, DenseLu, LinearSolver, NewtonSettings, SolverError, SparseLu,
};

/// Commonly used types and traits.
pub mod prelude {
    pub use crate::{
        Bjt, BjtParams, BjtType, Capacitor, Circuit, Component, CurrentSource, Diode, Inductor,
        NewtonSettings, OpAmp, Potentiometer, Resistor, Signal, VoltageSource, Waveform,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_builds_a_circuit() {
        let components: Vec<Box<dyn Component>> = vec![
            Box::new(CurrentSource::dc("I1", "0", "1", 1e-3)),
            Box::new(Resistor::new("R1", "1", "0", 1e3)),
        ];
        let circuit = Circuit::build(components).unwrap();
        assert_eq!(circuit.size(), 1);
    }

    #[test]
    fn test_units_are_reexported() {
        assert_eq!(crate::core::units::parse_value("1k"), Some(1000.0));
    }
}
