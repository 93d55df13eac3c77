//! Device models and MNA stamps for ampsim.
//!
//! This crate provides the stamp implementations for:
//! - Passive elements: resistor, capacitor, inductor, potentiometer
//! - Independent sources: V, I with DC, sine, pulse, PWL and
//!   host-fed input waveforms
//! - Controlled sources: VCVS, VCCS, CCCS, CCVS
//! - Nonlinear devices: generic two-terminal resistor, Shockley diode,
//!   Ebers-Moll BJT
//! - The ideal op-amp nullor
//!
//! Every model implements [`ampsim_core::Component`]: it registers the
//! nodes and matrix positions it touches, caches indirect handles at
//! bind time and accumulates its contribution through those handles on
//! every `fill`.

pub mod bjt;
pub mod controls;
pub mod diode;
pub mod dynamic;
pub mod opamp;
pub mod resistor;
pub mod sources;
pub mod waveforms;

pub use bjt::{Bjt, BjtParams, BjtType};
pub use controls::Potentiometer;
pub use diode::{Diode, IvCurve, NonlinearResistor, Shockley};
pub use dynamic::{Capacitor, Inductor};
pub use opamp::OpAmp;
pub use resistor::Resistor;
pub use sources::{Cccs, Ccvs, CurrentSource, Vccs, Vcvs, VoltageSource};
pub use waveforms::Waveform;
