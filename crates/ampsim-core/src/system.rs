//! Layered sparse MNA storage and typed stamp handles.
//!
//! The system owns one CSR pattern (from the frozen [`EntryTable`]) and
//! three parallel value layers for the matrix and the right-hand side:
//! static, dynamic and nonlinear. An *active layer* selector decides
//! which layer a handle write lands in, so the driver retargets every
//! bound stamp with a single assignment.
//!
//! Index 0 of every buffer is the ground scratch cell: handles resolve
//! ground rows/columns/nodes to index 0, writes there are discarded and
//! reads of the ground solution always yield `0.0`. Live entries sit at
//! `offset + 1` (matrix) and `index + 1` (vectors), which keeps `fill`
//! free of per-cell branches.

use crate::error::{Error, Result};
use crate::node;
use crate::table::EntryTable;

/// Which value layer handle writes currently target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Static,
    Dynamic,
    Nonlinear,
}

impl Layer {
    const fn index(self) -> usize {
        match self {
            Layer::Static => 0,
            Layer::Dynamic => 1,
            Layer::Nonlinear => 2,
        }
    }
}

/// Handle to one matrix value in the active layer.
///
/// The default handle is the ground sentinel: writes through it go to
/// the scratch cell and are never read back.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixEntry(usize);

/// Handle to one right-hand-side value in the active layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RhsEntry(usize);

/// Read handle into the current Newton iterate `x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolutionRef(usize);

/// Read handle into the last accepted time-step solution `x_state`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateRef(usize);

/// The assembled sparse system: pattern, value layers and state.
#[derive(Debug)]
pub struct SparseSystem {
    table: EntryTable,
    m: usize,
    nnz: usize,

    /// Matrix value layers, each `nnz + 1` long (slot 0 is scratch).
    a: [Vec<f64>; 3],
    /// Right-hand-side layers, each `m + 1` long (slot 0 is scratch).
    b: [Vec<f64>; 3],
    active: Layer,

    /// Current Newton iterate, `m + 1` long (slot 0 pinned to 0.0).
    x: Vec<f64>,
    /// Previous Newton iterate.
    x_prev: Vec<f64>,
    /// Last accepted time-step solution.
    x_state: Vec<f64>,

    /// Simulated time in seconds.
    pub time: f64,
    /// Last commanded step size in seconds.
    pub delta_time: f64,
}

impl SparseSystem {
    /// Allocate the value buffers for a frozen entry table.
    pub fn new(table: EntryTable) -> Self {
        debug_assert!(table.is_frozen(), "system built from an open table");
        let m = table.num_nodes();
        let nnz = table.num_entries();
        Self {
            table,
            m,
            nnz,
            a: [vec![0.0; nnz + 1], vec![0.0; nnz + 1], vec![0.0; nnz + 1]],
            b: [vec![0.0; m + 1], vec![0.0; m + 1], vec![0.0; m + 1]],
            active: Layer::Static,
            x: vec![0.0; m + 1],
            x_prev: vec![0.0; m + 1],
            x_state: vec![0.0; m + 1],
            time: 0.0,
            delta_time: 0.0,
        }
    }

    pub fn num_unknowns(&self) -> usize {
        self.m
    }

    pub fn num_entries(&self) -> usize {
        self.nnz
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    // ------------------------------------------------------------------
    // Handle resolution
    // ------------------------------------------------------------------

    /// Resolve a matrix position to a handle.
    ///
    /// Ground positions resolve to the dummy-write sentinel. A
    /// non-ground position that was never registered is an
    /// [`Error::InvalidPattern`].
    pub fn matrix_entry(&self, row: &str, col: &str) -> Result<MatrixEntry> {
        if node::is_ground(row) || node::is_ground(col) {
            return Ok(MatrixEntry(0));
        }
        self.table
            .offset(row, col)
            .map(|offset| MatrixEntry(offset + 1))
            .ok_or_else(|| Error::InvalidPattern {
                row: row.to_string(),
                col: col.to_string(),
            })
    }

    /// Resolve a right-hand-side position to a handle.
    pub fn rhs_entry(&self, name: &str) -> Result<RhsEntry> {
        self.vector_slot(name).map(RhsEntry)
    }

    /// Resolve a read handle into the live solution vector.
    pub fn solution_ref(&self, name: &str) -> Result<SolutionRef> {
        self.vector_slot(name).map(SolutionRef)
    }

    /// Resolve a read handle into the accepted state vector.
    pub fn state_ref(&self, name: &str) -> Result<StateRef> {
        self.vector_slot(name).map(StateRef)
    }

    fn vector_slot(&self, name: &str) -> Result<usize> {
        if node::is_ground(name) {
            return Ok(0);
        }
        self.table
            .node_index(name)
            .map(|index| index + 1)
            .ok_or_else(|| Error::NodeNotFound(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Stamp writes and state reads
    // ------------------------------------------------------------------

    /// Accumulate into the active matrix layer.
    #[inline]
    pub fn add_a(&mut self, entry: MatrixEntry, value: f64) {
        self.a[self.active.index()][entry.0] += value;
    }

    /// Accumulate into the active right-hand-side layer.
    #[inline]
    pub fn add_b(&mut self, entry: RhsEntry, value: f64) {
        self.b[self.active.index()][entry.0] += value;
    }

    /// Read the current Newton iterate. Ground reads yield `0.0`.
    #[inline]
    pub fn solution(&self, entry: SolutionRef) -> f64 {
        self.x[entry.0]
    }

    /// Read the last accepted solution. Ground reads yield `0.0`.
    #[inline]
    pub fn state(&self, entry: StateRef) -> f64 {
        self.x_state[entry.0]
    }

    // ------------------------------------------------------------------
    // Layer management (driver only)
    // ------------------------------------------------------------------

    pub fn set_active(&mut self, layer: Layer) {
        self.active = layer;
    }

    pub fn active(&self) -> Layer {
        self.active
    }

    /// Zero the active matrix and rhs layer.
    pub fn clear_active(&mut self) {
        let k = self.active.index();
        self.a[k].fill(0.0);
        self.b[k].fill(0.0);
    }

    /// Prefill the active layer from another layer.
    ///
    /// Copies the `nnz` matrix values and the `m` rhs values (the rhs
    /// copy is vector-sized on purpose; see the design notes).
    pub fn copy_active_from(&mut self, src: Layer) {
        debug_assert_ne!(src, self.active, "layer copied onto itself");
        copy_between(&mut self.a, src.index(), self.active.index());
        copy_between(&mut self.b, src.index(), self.active.index());
    }

    /// Seed the dynamic and nonlinear layers from the static layer,
    /// part of the one-time build sequence.
    pub fn seed_from_static(&mut self) {
        for layer in [Layer::Dynamic, Layer::Nonlinear] {
            copy_between(&mut self.a, Layer::Static.index(), layer.index());
            copy_between(&mut self.b, Layer::Static.index(), layer.index());
        }
    }

    /// Read-only view of a matrix layer's live values.
    pub fn layer_a(&self, layer: Layer) -> &[f64] {
        &self.a[layer.index()][1..]
    }

    /// Read-only view of a rhs layer's live values.
    pub fn layer_b(&self, layer: Layer) -> &[f64] {
        &self.b[layer.index()][1..]
    }

    // ------------------------------------------------------------------
    // Newton iterate plumbing (driver only)
    // ------------------------------------------------------------------

    /// Preserve the current iterate before a solve overwrites `x`.
    pub fn swap_iterates(&mut self) {
        std::mem::swap(&mut self.x, &mut self.x_prev);
    }

    /// Everything a linear solve needs, in one borrow: the CSR pattern,
    /// the active matrix and rhs values, and the mutable solution.
    pub fn solve_views(&mut self) -> (&[usize], &[usize], &[f64], &[f64], &mut [f64]) {
        let k = self.active.index();
        (
            self.table.row_ptr(),
            self.table.col_ind(),
            &self.a[k][1..],
            &self.b[k][1..],
            &mut self.x[1..],
        )
    }

    /// Componentwise absolute-relative convergence test between the
    /// current and previous iterates. Empty systems are converged.
    pub fn converged(&self, rtol: f64, atol: f64) -> bool {
        self.x[1..]
            .iter()
            .zip(self.x_prev[1..].iter())
            .all(|(xi, pi)| (xi - pi).abs() <= rtol.mul_add(pi.abs(), atol))
    }

    /// Accept the current solution as the new time-step state.
    pub fn commit_state(&mut self) {
        self.x_state.copy_from_slice(&self.x);
    }

    /// Live solution values (without the ground slot), for tests.
    pub fn solution_values(&self) -> &[f64] {
        &self.x[1..]
    }

    /// Mutable live solution values, for seeding initial conditions.
    pub fn solution_values_mut(&mut self) -> &mut [f64] {
        &mut self.x[1..]
    }
}

fn copy_between(buffers: &mut [Vec<f64>; 3], src: usize, dst: usize) {
    debug_assert_ne!(src, dst);
    if src < dst {
        let (head, tail) = buffers.split_at_mut(dst);
        tail[0].copy_from_slice(&head[src]);
    } else {
        let (head, tail) = buffers.split_at_mut(src);
        head[dst].copy_from_slice(&tail[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_system() -> SparseSystem {
        let mut table = EntryTable::new();
        table.register_node("1");
        table.register_node("2");
        table.register_entry("1", "1");
        table.register_entry("1", "2");
        table.register_entry("2", "1");
        table.register_entry("2", "2");
        table.freeze().unwrap();
        SparseSystem::new(table)
    }

    #[test]
    fn test_ground_sentinel_discards_writes() {
        let mut sys = two_node_system();
        let ground = sys.matrix_entry("1", "0").unwrap();
        let live = sys.matrix_entry("1", "1").unwrap();

        sys.add_a(ground, 42.0);
        sys.add_a(live, 2.5);

        assert_eq!(sys.layer_a(Layer::Static), &[2.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ground_state_reads_zero() {
        let mut sys = two_node_system();
        sys.x[1] = 7.0;
        sys.commit_state();
        let gx = sys.solution_ref("0").unwrap();
        let gs = sys.state_ref("0").unwrap();
        assert_eq!(sys.solution(gx), 0.0);
        assert_eq!(sys.state(gs), 0.0);
    }

    #[test]
    fn test_unknown_entry_is_invalid_pattern() {
        let sys = two_node_system();
        assert!(matches!(
            sys.matrix_entry("2", "7"),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            sys.rhs_entry("7"),
            Err(Error::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_active_layer_retargets_writes() {
        let mut sys = two_node_system();
        let entry = sys.matrix_entry("2", "2").unwrap();

        sys.set_active(Layer::Static);
        sys.add_a(entry, 1.0);
        sys.set_active(Layer::Dynamic);
        sys.add_a(entry, 2.0);

        assert_eq!(sys.layer_a(Layer::Static)[3], 1.0);
        assert_eq!(sys.layer_a(Layer::Dynamic)[3], 2.0);
        assert_eq!(sys.layer_a(Layer::Nonlinear)[3], 0.0);
    }

    #[test]
    fn test_prefill_copies_layers() {
        let mut sys = two_node_system();
        let entry = sys.matrix_entry("1", "2").unwrap();
        let rhs = sys.rhs_entry("1").unwrap();

        sys.set_active(Layer::Static);
        sys.add_a(entry, -3.0);
        sys.add_b(rhs, 0.5);
        sys.seed_from_static();

        assert_eq!(sys.layer_a(Layer::Nonlinear)[1], -3.0);
        assert_eq!(sys.layer_b(Layer::Dynamic)[0], 0.5);

        // dynamic prefill after further static edits
        sys.add_a(entry, -1.0);
        sys.set_active(Layer::Dynamic);
        sys.copy_active_from(Layer::Static);
        assert_eq!(sys.layer_a(Layer::Dynamic)[1], -4.0);
    }

    #[test]
    fn test_convergence_is_componentwise() {
        let mut sys = two_node_system();
        sys.x[1] = 1.0;
        sys.x[2] = -2.0;
        sys.x_prev[1] = 1.0 + 5e-6;
        sys.x_prev[2] = -2.0;
        assert!(sys.converged(1e-3, 1e-5));

        sys.x_prev[2] = -2.1;
        assert!(!sys.converged(1e-3, 1e-5));
    }

    #[test]
    fn test_commit_preserves_iterate() {
        let mut sys = two_node_system();
        sys.x[1] = 0.25;
        sys.x[2] = 0.75;
        sys.commit_state();
        let h = sys.state_ref("2").unwrap();
        assert_eq!(sys.state(h), 0.75);
    }
}
