//! Newton-Raphson iteration over the nonlinear layer.

use ampsim_core::{Component, Layer, SparseSystem};

use crate::linear::LinearSolver;

/// Convergence tolerances and the iteration cap.
#[derive(Debug, Clone)]
pub struct NewtonSettings {
    /// Relative tolerance against the previous iterate.
    pub rtol: f64,
    /// Absolute tolerance floor.
    pub atol: f64,
    /// Iteration cap before giving up on the step.
    pub max_iterations: usize,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-5,
            max_iterations: 200,
        }
    }
}

/// Iterate linearize-and-solve until the solution settles.
///
/// Each pass prefills the nonlinear layer from the dynamic layer,
/// stamps every nonlinear component at the current iterate, preserves
/// the iterate and solves the refreshed system. The first pass uses
/// whatever the solution vector held at entry, which for audio-rate
/// stepping is the previous sample's solution and the warm start the
/// convergence budget relies on.
///
/// Returns `i >= 1` after converging in `i` iterations, `0` when the
/// iteration cap was reached, `-i` when the linear solve failed at
/// iteration `i`.
pub fn run(
    system: &mut SparseSystem,
    components: &[Box<dyn Component>],
    nonlinear: &[usize],
    solver: &mut dyn LinearSolver,
    settings: &NewtonSettings,
) -> i32 {
    for i in 1..=settings.max_iterations as i32 {
        system.set_active(Layer::Nonlinear);
        system.copy_active_from(Layer::Dynamic);
        for &index in nonlinear {
            components[index].fill(system);
        }

        system.swap_iterates();

        let (row_ptr, col_ind, values, rhs, x) = system.solve_views();
        if let Err(err) = solver.factor(row_ptr, col_ind, values) {
            log::warn!("factorization failed at Newton iteration {i}: {err}");
            return -i;
        }
        if let Err(err) = solver.solve(rhs, x) {
            log::warn!("solve failed at Newton iteration {i}: {err}");
            return -i;
        }

        if system.converged(settings.rtol, settings.atol) {
            return i;
        }
    }

    0
}
