//! Bipolar junction transistor (Ebers-Moll).
//!
//! The transistor is composed from four primitive stamps: a
//! base-emitter diode, a base-collector diode and two current-controlled
//! current sources that transport `α_F = B_F/(1+B_F)` of the emitter
//! diode current to the collector and `α_R = B_R/(1+B_R)` of the
//! collector diode current to the emitter. The diodes hang off internal
//! nodes `be@<id>` and `bc@<id>`; the CCCS sensing branches connect the
//! base to those nodes, so each sensed current is exactly the
//! corresponding junction current. NPN and PNP differ only in diode
//! orientation.

use ampsim_core::{
    node, Classification, Component, EntryTable, Result, SignalBank, SparseSystem,
};

use crate::diode::Diode;
use crate::sources::Cccs;

/// Transistor polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BjtType {
    Npn,
    Pnp,
}

/// Ebers-Moll model parameters.
#[derive(Debug, Clone)]
pub struct BjtParams {
    /// Saturation current (A).
    pub is: f64,
    /// Forward current gain.
    pub bf: f64,
    /// Reverse current gain.
    pub br: f64,
}

impl Default for BjtParams {
    fn default() -> Self {
        Self {
            is: 1e-16,
            bf: 100.0,
            br: 1.0,
        }
    }
}

/// A bipolar transistor between collector, base and emitter nodes.
#[derive(Debug, Clone)]
pub struct Bjt {
    name: String,
    bjt_type: BjtType,

    diode_e: Diode,
    diode_c: Diode,
    forward: Cccs,
    reverse: Cccs,
}

impl Bjt {
    /// Create an NPN transistor.
    pub fn npn(
        name: impl Into<String>,
        collector: impl Into<String>,
        base: impl Into<String>,
        emitter: impl Into<String>,
        params: BjtParams,
    ) -> Self {
        Self::new(name, collector, base, emitter, BjtType::Npn, params)
    }

    /// Create a PNP transistor.
    pub fn pnp(
        name: impl Into<String>,
        collector: impl Into<String>,
        base: impl Into<String>,
        emitter: impl Into<String>,
        params: BjtParams,
    ) -> Self {
        Self::new(name, collector, base, emitter, BjtType::Pnp, params)
    }

    pub fn new(
        name: impl Into<String>,
        collector: impl Into<String>,
        base: impl Into<String>,
        emitter: impl Into<String>,
        bjt_type: BjtType,
        params: BjtParams,
    ) -> Self {
        let name = name.into();
        let collector = collector.into();
        let base = base.into();
        let emitter = emitter.into();

        let node_be = node::internal_node("be", &name);
        let node_bc = node::internal_node("bc", &name);

        let alpha_f = params.bf / (1.0 + params.bf);
        let alpha_r = params.br / (1.0 + params.br);

        // the diodes point into the junction nodes for NPN, out of
        // them for PNP
        let (diode_e, diode_c) = match bjt_type {
            BjtType::Npn => (
                Diode::new(format!("De@{name}"), node_be.clone(), emitter.clone(), params.is, 1.0),
                Diode::new(format!("Dc@{name}"), node_bc.clone(), collector.clone(), params.is, 1.0),
            ),
            BjtType::Pnp => (
                Diode::new(format!("De@{name}"), emitter.clone(), node_be.clone(), params.is, 1.0),
                Diode::new(format!("Dc@{name}"), collector.clone(), node_bc.clone(), params.is, 1.0),
            ),
        };

        let forward = Cccs::new(
            format!("Ff@{name}"),
            collector.clone(),
            base.clone(),
            base.clone(),
            node_be,
            alpha_f,
        );
        let reverse = Cccs::new(
            format!("Fr@{name}"),
            emitter,
            base.clone(),
            base,
            node_bc,
            alpha_r,
        );

        Self {
            name,
            bjt_type,
            diode_e,
            diode_c,
            forward,
            reverse,
        }
    }

    pub fn bjt_type(&self) -> BjtType {
        self.bjt_type
    }
}

impl Component for Bjt {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::NONLINEAR
    }

    fn register(&mut self, table: &mut EntryTable, signals: &mut SignalBank) {
        self.diode_e.register(table, signals);
        self.diode_c.register(table, signals);
        self.forward.register(table, signals);
        self.reverse.register(table, signals);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.diode_e.bind(system)?;
        self.diode_c.bind(system)?;
        self.forward.bind(system)?;
        self.reverse.bind(system)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        self.diode_e.fill(system);
        self.diode_c.fill(system);
        self.forward.fill(system);
        self.reverse.fill(system);
    }
}
