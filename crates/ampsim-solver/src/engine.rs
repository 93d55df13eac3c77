//! The simulation driver.
//!
//! [`Circuit`] owns the sparse system, the component lists and the
//! linear solver. `build` walks every component twice (register, then
//! bind) to compute the sparsity pattern and cache stamp handles, then
//! writes the static layer once. `advance` refreshes the dynamic layer
//! and runs the Newton loop, committing the accepted solution as the
//! new state.
//!
//! After `build` returns, `advance` neither allocates nor blocks; it is
//! meant to be called from a real-time audio thread while a control
//! thread writes [`Signal`]s.

use std::collections::BTreeMap;

use ampsim_core::{
    Component, Error, Layer, Result, Signal, SignalBank, SolutionRef, SparseSystem, StateRef,
};

use crate::amd;
use crate::linear::{default_solver, LinearSolver};
use crate::newton::{self, NewtonSettings};

/// A built circuit, ready to be stepped at sample rate.
pub struct Circuit {
    system: SparseSystem,
    components: Vec<Box<dyn Component>>,
    static_members: Vec<usize>,
    dynamic_members: Vec<usize>,
    nonlinear_members: Vec<usize>,
    solver: Box<dyn LinearSolver>,
    signals: SignalBank,
    settings: NewtonSettings,
}

impl Circuit {
    /// Build a circuit with default Newton settings and an
    /// automatically chosen solver.
    pub fn build(components: Vec<Box<dyn Component>>) -> Result<Self> {
        Self::build_with(components, NewtonSettings::default())
    }

    /// Build a circuit with explicit Newton settings.
    pub fn build_with(
        mut components: Vec<Box<dyn Component>>,
        settings: NewtonSettings,
    ) -> Result<Self> {
        // registration pass, in declared order
        let mut table = ampsim_core::EntryTable::new();
        let mut signals = SignalBank::new();
        for component in components.iter_mut() {
            component.register(&mut table, &mut signals);
        }
        table.freeze()?;

        // fill-reducing ordering over the symbolic pattern
        let perm = amd::min_degree(table.num_nodes(), table.row_ptr(), table.col_ind());
        table.permute(&perm)?;

        let m = table.num_nodes();
        let nnz = table.num_entries();
        log::debug!("circuit pattern: {m} unknowns, {nnz} entries");

        let mut system = SparseSystem::new(table);

        // partition by classification, preserving declared order
        let mut static_members = Vec::new();
        let mut dynamic_members = Vec::new();
        let mut nonlinear_members = Vec::new();
        for (index, component) in components.iter().enumerate() {
            let class = component.classification();
            if class.is_static {
                static_members.push(index);
            }
            if class.is_dynamic {
                dynamic_members.push(index);
            }
            if class.is_nonlinear {
                nonlinear_members.push(index);
            }
        }

        // bind pass: static, then dynamic, then nonlinear
        for &index in static_members
            .iter()
            .chain(dynamic_members.iter())
            .chain(nonlinear_members.iter())
        {
            components[index].bind(&system)?;
        }

        // one-time static layer, seeding the other layers
        system.set_active(Layer::Static);
        system.clear_active();
        for &index in &static_members {
            components[index].fill(&mut system);
        }
        system.seed_from_static();

        let mut solver = default_solver(m);
        {
            let (row_ptr, col_ind) = (system.table().row_ptr(), system.table().col_ind());
            solver
                .analyze(m, row_ptr, col_ind)
                .map_err(|err| Error::Solver(err.to_string()))?;
        }
        log::debug!(
            "circuit built: {} static, {} dynamic, {} nonlinear components, {} solver",
            static_members.len(),
            dynamic_members.len(),
            nonlinear_members.len(),
            solver.name()
        );

        Ok(Self {
            system,
            components,
            static_members,
            dynamic_members,
            nonlinear_members,
            solver,
            signals,
            settings,
        })
    }

    /// Advance simulated time by `delta_t` seconds.
    ///
    /// Returns the spec'd signed step code: `i >= 1` converged in `i`
    /// Newton iterations, `0` hit the iteration limit, `-i` the linear
    /// solve failed at iteration `i`. The accepted state is updated
    /// only on `i >= 1`; a non-positive or non-finite `delta_t` is
    /// rejected up front.
    pub fn advance(&mut self, delta_t: f64) -> Result<i32> {
        if !delta_t.is_finite() || delta_t <= 0.0 {
            return Err(Error::InvalidTimestep(delta_t));
        }

        self.system.delta_time = delta_t;
        self.system.time += delta_t;

        // dynamic layer: static baseline plus per-step companions
        self.system.set_active(Layer::Dynamic);
        self.system.copy_active_from(Layer::Static);
        for &index in &self.dynamic_members {
            self.components[index].fill(&mut self.system);
        }

        let iterations = newton::run(
            &mut self.system,
            &self.components,
            &self.nonlinear_members,
            self.solver.as_mut(),
            &self.settings,
        );

        if iterations > 0 {
            self.system.commit_state();
        } else {
            log::warn!(
                "step rejected at t={}: newton returned {iterations}",
                self.system.time
            );
        }
        Ok(iterations)
    }

    /// Like [`Circuit::advance`], but with the failure codes mapped
    /// onto errors for hosts that prefer `?` over inspecting codes.
    pub fn try_advance(&mut self, delta_t: f64) -> Result<u32> {
        match self.advance(delta_t)? {
            0 => Err(Error::NotConverged(self.settings.max_iterations)),
            code if code < 0 => Err(Error::SingularJacobian),
            code => Ok(code as u32),
        }
    }

    /// Read-only handle to a node's live solution value.
    pub fn x_handle(&self, name: &str) -> Result<SolutionRef> {
        self.system.solution_ref(name)
    }

    /// Read-only handle to a node's last accepted value.
    pub fn state_handle(&self, name: &str) -> Result<StateRef> {
        self.system.state_ref(name)
    }

    /// Dereference a solution handle.
    pub fn x(&self, handle: SolutionRef) -> f64 {
        self.system.solution(handle)
    }

    /// Dereference a state handle.
    pub fn state(&self, handle: StateRef) -> f64 {
        self.system.state(handle)
    }

    /// Convenience lookup of the live solution by node name.
    pub fn solution(&self, name: &str) -> Result<f64> {
        Ok(self.system.solution(self.system.solution_ref(name)?))
    }

    /// Shared control parameter registered under `name`.
    pub fn param(&self, name: &str) -> Result<Signal> {
        self.signals
            .param(name)
            .ok_or_else(|| Error::ParamNotFound(name.to_string()))
    }

    /// Shared input feed registered under `name`.
    pub fn input(&self, name: &str) -> Result<Signal> {
        self.signals
            .input(name)
            .ok_or_else(|| Error::InputNotFound(name.to_string()))
    }

    /// Final node directory, for introspection and tests.
    pub fn nodes(&self) -> &BTreeMap<String, usize> {
        self.system.table().nodes()
    }

    /// Registered entries and their offsets.
    pub fn entries(&self) -> &BTreeMap<(String, String), usize> {
        self.system.table().entries()
    }

    pub fn time(&self) -> f64 {
        self.system.time
    }

    pub fn delta_time(&self) -> f64 {
        self.system.delta_time
    }

    /// Number of unknowns (non-ground nodes plus branch currents).
    pub fn size(&self) -> usize {
        self.system.num_unknowns()
    }

    /// Number of stored matrix entries.
    pub fn nnz(&self) -> usize {
        self.system.num_entries()
    }

    pub fn settings(&self) -> &NewtonSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampsim_devices::{CurrentSource, Resistor, VoltageSource};

    fn divider() -> Vec<Box<dyn Component>> {
        vec![
            Box::new(VoltageSource::dc("V1", "1", "0", 1.0)),
            Box::new(Resistor::new("R1", "1", "2", 1.0)),
            Box::new(Resistor::new("R2", "2", "0", 1.0)),
        ]
    }

    #[test]
    fn test_build_registers_all_nodes() {
        let circuit = Circuit::build(divider()).unwrap();
        let nodes = circuit.nodes();
        assert!(nodes.contains_key("1"));
        assert!(nodes.contains_key("2"));
        assert!(nodes.contains_key("@JV1"));
        assert!(!nodes.contains_key("0"));
        assert_eq!(circuit.size(), 3);
    }

    #[test]
    fn test_advance_solves_divider() {
        let mut circuit = Circuit::build(divider()).unwrap();
        let iterations = circuit.advance(1e-5).unwrap();
        assert!(iterations > 0);
        assert!((circuit.solution("1").unwrap() - 1.0).abs() < 1e-9);
        assert!((circuit.solution("2").unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_linear_circuit_warm_start_converges_in_one() {
        let mut circuit = Circuit::build(divider()).unwrap();
        assert!(circuit.advance(1e-5).unwrap() > 0);
        // once warm, a linear circuit settles immediately
        assert_eq!(circuit.advance(1e-5).unwrap(), 1);
    }

    #[test]
    fn test_time_accounting() {
        let mut circuit = Circuit::build(divider()).unwrap();
        circuit.advance(1e-5).unwrap();
        circuit.advance(2e-5).unwrap();
        assert!((circuit.time() - 3e-5).abs() < 1e-18);
        assert_eq!(circuit.delta_time(), 2e-5);
    }

    #[test]
    fn test_invalid_timestep_is_rejected() {
        let mut circuit = Circuit::build(divider()).unwrap();
        assert!(matches!(
            circuit.advance(0.0),
            Err(Error::InvalidTimestep(_))
        ));
        assert!(matches!(
            circuit.advance(f64::NAN),
            Err(Error::InvalidTimestep(_))
        ));
        assert!(matches!(
            circuit.advance(-1.0),
            Err(Error::InvalidTimestep(_))
        ));
    }

    #[test]
    fn test_current_divider() {
        let components: Vec<Box<dyn Component>> = vec![
            Box::new(CurrentSource::dc("I1", "0", "1", 0.01)),
            Box::new(Resistor::new("R1", "1", "0", 1e3)),
            Box::new(Resistor::new("R2", "1", "0", 1e3)),
        ];
        let mut circuit = Circuit::build(components).unwrap();
        assert!(circuit.advance(1e-5).unwrap() > 0);
        // 10 mA into two parallel 1k resistors
        assert!((circuit.solution("1").unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_circuit_reports_failure() {
        // a lone current source into a floating node has no DC path
        let components: Vec<Box<dyn Component>> = vec![Box::new(CurrentSource::dc(
            "I1", "0", "1", 1e-3,
        ))];
        let mut circuit = Circuit::build(components).unwrap();
        let code = circuit.advance(1e-5).unwrap();
        assert!(code < 0, "expected a solver failure code, got {code}");
        assert!(matches!(
            circuit.try_advance(1e-5),
            Err(Error::SingularJacobian)
        ));
    }

    #[test]
    fn test_handles_track_state_and_solution() {
        let mut circuit = Circuit::build(divider()).unwrap();
        let x2 = circuit.x_handle("2").unwrap();
        let s2 = circuit.state_handle("2").unwrap();

        assert_eq!(circuit.x(x2), 0.0);
        circuit.advance(1e-5).unwrap();
        assert!((circuit.x(x2) - 0.5).abs() < 1e-9);
        assert!((circuit.state(s2) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ground_handles_read_zero() {
        let circuit = Circuit::build(divider()).unwrap();
        let g = circuit.x_handle("0").unwrap();
        assert_eq!(circuit.x(g), 0.0);
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let circuit = Circuit::build(divider()).unwrap();
        assert!(circuit.x_handle("nope").is_err());
        assert!(circuit.param("nope").is_err());
        assert!(circuit.input("nope").is_err());
    }
}
