//! Energy-storage elements with trapezoidal companion models.
//!
//! Each element introduces one branch-current unknown `j` and, at every
//! time step, is replaced by a Thevenin pair `(R_dyn, V_dyn)` computed
//! from the last accepted solution:
//!
//! - capacitor: `R_dyn = Δt/(2C)`, `V_dyn = v⁰ + R_dyn·j⁰`
//! - inductor:  `R_dyn = 2L/Δt`,   `V_dyn = −(v⁰ + R_dyn·j⁰)`
//!
//! where `v⁰` is the previous voltage across the element and `j⁰` the
//! previous branch current. The pair feeds the standard voltage-source
//! pattern augmented by `R_dyn` on the branch diagonal.

use ampsim_core::{
    node, Classification, Component, EntryTable, MatrixEntry, Result, RhsEntry, SignalBank,
    SparseSystem, StateRef,
};

/// Cached handles for the shared branch pattern.
#[derive(Debug, Clone, Copy, Default)]
struct BranchStamp {
    aj: MatrixEntry,
    bj: MatrixEntry,
    ja: MatrixEntry,
    jb: MatrixEntry,
    jj: MatrixEntry,
    rhs_j: RhsEntry,
    state_a: StateRef,
    state_b: StateRef,
    state_j: StateRef,
}

impl BranchStamp {
    fn register(table: &mut EntryTable, a: &str, b: &str, j: &str) {
        table.register_node(a);
        table.register_node(b);
        table.register_node(j);

        table.register_entry(a, j);
        table.register_entry(b, j);
        table.register_entry(j, a);
        table.register_entry(j, b);
        table.register_entry(j, j);
    }

    fn bind(&mut self, system: &SparseSystem, a: &str, b: &str, j: &str) -> Result<()> {
        self.aj = system.matrix_entry(a, j)?;
        self.bj = system.matrix_entry(b, j)?;
        self.ja = system.matrix_entry(j, a)?;
        self.jb = system.matrix_entry(j, b)?;
        self.jj = system.matrix_entry(j, j)?;
        self.rhs_j = system.rhs_entry(j)?;
        self.state_a = system.state_ref(a)?;
        self.state_b = system.state_ref(b)?;
        self.state_j = system.state_ref(j)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem, r_dyn: f64, v_dyn: f64) {
        system.add_a(self.aj, 1.0);
        system.add_a(self.bj, -1.0);
        system.add_a(self.ja, -1.0);
        system.add_a(self.jb, 1.0);
        system.add_a(self.jj, r_dyn);
        system.add_b(self.rhs_j, -v_dyn);
    }

    fn previous(&self, system: &SparseSystem) -> (f64, f64) {
        let v0 = system.state(self.state_a) - system.state(self.state_b);
        let j0 = system.state(self.state_j);
        (v0, j0)
    }
}

/// A linear capacitor integrated with the trapezoidal rule.
#[derive(Debug, Clone)]
pub struct Capacitor {
    name: String,
    node_a: String,
    node_b: String,
    node_j: String,
    /// Precomputed `1/(2C)`.
    half_inv_c: f64,
    stamp: BranchStamp,
}

impl Capacitor {
    /// Create a capacitor of `capacitance` farads between `a` and `b`.
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        capacitance: f64,
    ) -> Self {
        let name = name.into();
        let node_j = node::branch_node(&name);
        Self {
            name,
            node_a: a.into(),
            node_b: b.into(),
            node_j,
            half_inv_c: 0.5 / capacitance,
            stamp: BranchStamp::default(),
        }
    }
}

impl Component for Capacitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::DYNAMIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        BranchStamp::register(table, &self.node_a, &self.node_b, &self.node_j);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.stamp
            .bind(system, &self.node_a, &self.node_b, &self.node_j)
    }

    fn fill(&self, system: &mut SparseSystem) {
        let (v0, j0) = self.stamp.previous(system);
        let r_dyn = system.delta_time * self.half_inv_c;
        let v_dyn = v0 + r_dyn * j0;
        self.stamp.fill(system, r_dyn, v_dyn);
    }
}

/// A linear inductor integrated with the trapezoidal rule.
#[derive(Debug, Clone)]
pub struct Inductor {
    name: String,
    node_a: String,
    node_b: String,
    node_j: String,
    /// Precomputed `2L`.
    twice_l: f64,
    stamp: BranchStamp,
}

impl Inductor {
    /// Create an inductor of `inductance` henries between `a` and `b`.
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        inductance: f64,
    ) -> Self {
        let name = name.into();
        let node_j = node::branch_node(&name);
        Self {
            name,
            node_a: a.into(),
            node_b: b.into(),
            node_j,
            twice_l: 2.0 * inductance,
            stamp: BranchStamp::default(),
        }
    }
}

impl Component for Inductor {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::DYNAMIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        BranchStamp::register(table, &self.node_a, &self.node_b, &self.node_j);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.stamp
            .bind(system, &self.node_a, &self.node_b, &self.node_j)
    }

    fn fill(&self, system: &mut SparseSystem) {
        let (v0, j0) = self.stamp.previous(system);
        let r_dyn = self.twice_l / system.delta_time;
        let v_dyn = -(v0 + r_dyn * j0);
        self.stamp.fill(system, r_dyn, v_dyn);
    }
}
