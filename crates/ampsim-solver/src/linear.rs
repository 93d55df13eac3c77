//! The pluggable linear-solver boundary.
//!
//! A [`LinearSolver`] factors and solves the square unsymmetric system
//! assembled by the driver. `analyze` sees the CSR pattern once per
//! build and sizes every buffer; `factor` and `solve` run on every
//! Newton iteration and must not allocate, since they sit on the audio
//! thread.
//!
//! Two implementations ship: [`DenseLu`], an in-place partial-pivot LU
//! over a scattered `nalgebra` matrix and the right default for
//! audio-rate circuits with a few dozen unknowns, and the native
//! [`SparseLu`](crate::SparseLu) for larger patterns.
//! [`default_solver`] picks by size.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverError;
use crate::sparse_lu::SparseLu;

/// Pivot magnitudes at or below this are treated as singular.
pub(crate) const PIVOT_TOL: f64 = 1e-14;

/// A direct solver for `A x = b` over a fixed CSR pattern.
pub trait LinearSolver: Send {
    /// Inspect the sparsity pattern. Called once per build.
    fn analyze(
        &mut self,
        m: usize,
        row_ptr: &[usize],
        col_ind: &[usize],
    ) -> Result<(), SolverError>;

    /// Factor the matrix values laid out on the analyzed pattern.
    fn factor(
        &mut self,
        row_ptr: &[usize],
        col_ind: &[usize],
        values: &[f64],
    ) -> Result<(), SolverError>;

    /// Solve with the last factorization into `x`.
    fn solve(&mut self, rhs: &[f64], x: &mut [f64]) -> Result<(), SolverError>;

    fn name(&self) -> &'static str;
}

/// Systems at or below this size use the dense solver.
pub const DENSE_CUTOFF: usize = 64;

/// Pick a solver implementation for a system of `m` unknowns.
pub fn default_solver(m: usize) -> Box<dyn LinearSolver> {
    if m <= DENSE_CUTOFF {
        Box::new(DenseLu::new())
    } else {
        Box::new(SparseLu::new())
    }
}

/// In-place LU with partial pivoting over a dense scatter of the
/// sparse system. Everything is preallocated at `analyze`.
#[derive(Debug)]
pub struct DenseLu {
    m: usize,
    matrix: DMatrix<f64>,
    lu: DMatrix<f64>,
    pivots: Vec<usize>,
    scratch: DVector<f64>,
    factored: bool,
}

impl DenseLu {
    pub fn new() -> Self {
        Self {
            m: 0,
            matrix: DMatrix::zeros(0, 0),
            lu: DMatrix::zeros(0, 0),
            pivots: Vec::new(),
            scratch: DVector::zeros(0),
            factored: false,
        }
    }
}

impl Default for DenseLu {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSolver for DenseLu {
    fn analyze(
        &mut self,
        m: usize,
        row_ptr: &[usize],
        col_ind: &[usize],
    ) -> Result<(), SolverError> {
        check_pattern(m, row_ptr, col_ind)?;
        self.m = m;
        self.matrix = DMatrix::zeros(m, m);
        self.lu = DMatrix::zeros(m, m);
        self.pivots = vec![0; m];
        self.scratch = DVector::zeros(m);
        self.factored = false;
        Ok(())
    }

    fn factor(
        &mut self,
        row_ptr: &[usize],
        col_ind: &[usize],
        values: &[f64],
    ) -> Result<(), SolverError> {
        let m = self.m;
        self.factored = false;

        self.matrix.fill(0.0);
        for row in 0..m {
            for k in row_ptr[row]..row_ptr[row + 1] {
                self.matrix[(row, col_ind[k])] += values[k];
            }
        }
        self.lu.copy_from(&self.matrix);
        for (i, pivot) in self.pivots.iter_mut().enumerate() {
            *pivot = i;
        }

        for k in 0..m {
            // partial pivoting: largest magnitude in the column
            let mut max_val = self.lu[(k, k)].abs();
            let mut max_row = k;
            for i in (k + 1)..m {
                let val = self.lu[(i, k)].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }
            if max_val <= PIVOT_TOL {
                return Err(SolverError::Singular(k));
            }
            if max_row != k {
                self.pivots.swap(k, max_row);
                self.lu.swap_rows(k, max_row);
            }

            let pivot = self.lu[(k, k)];
            for i in (k + 1)..m {
                let factor = self.lu[(i, k)] / pivot;
                self.lu[(i, k)] = factor;
                for j in (k + 1)..m {
                    self.lu[(i, j)] -= factor * self.lu[(k, j)];
                }
            }
        }

        self.factored = true;
        Ok(())
    }

    fn solve(&mut self, rhs: &[f64], x: &mut [f64]) -> Result<(), SolverError> {
        if !self.factored {
            return Err(SolverError::NotFactored);
        }
        let m = self.m;
        if rhs.len() != m || x.len() != m {
            return Err(SolverError::InvalidSystem(format!(
                "rhs of length {} against {m} unknowns",
                rhs.len()
            )));
        }

        // permuted rhs, then L y = Pb with unit diagonal
        for i in 0..m {
            self.scratch[i] = rhs[self.pivots[i]];
        }
        for i in 0..m {
            for j in 0..i {
                let y_j = self.scratch[j];
                self.scratch[i] -= self.lu[(i, j)] * y_j;
            }
        }

        // U x = y
        for i in (0..m).rev() {
            for j in (i + 1)..m {
                let x_j = self.scratch[j];
                self.scratch[i] -= self.lu[(i, j)] * x_j;
            }
            self.scratch[i] /= self.lu[(i, i)];
        }

        x.copy_from_slice(self.scratch.as_slice());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dense-lu"
    }
}

pub(crate) fn check_pattern(
    m: usize,
    row_ptr: &[usize],
    col_ind: &[usize],
) -> Result<(), SolverError> {
    if row_ptr.len() != m + 1 {
        return Err(SolverError::InvalidSystem(format!(
            "row pointer length {} for {m} unknowns",
            row_ptr.len()
        )));
    }
    if row_ptr[m] != col_ind.len() {
        return Err(SolverError::InvalidSystem(format!(
            "row pointer ends at {} but {} columns stored",
            row_ptr[m],
            col_ind.len()
        )));
    }
    if col_ind.iter().any(|&c| c >= m) {
        return Err(SolverError::InvalidSystem(
            "column index out of range".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_solves_2x2() {
        // [2 0; 1 3] x = [4, 7] -> x = [2, 5/3]
        let row_ptr = [0, 1, 3];
        let col_ind = [0, 0, 1];
        let values = [2.0, 1.0, 3.0];
        let rhs = [4.0, 7.0];
        let mut x = [0.0; 2];

        let mut solver = DenseLu::new();
        solver.analyze(2, &row_ptr, &col_ind).unwrap();
        solver.factor(&row_ptr, &col_ind, &values).unwrap();
        solver.solve(&rhs, &mut x).unwrap();

        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_dense_pivots_a_zero_diagonal() {
        // [0 1; 1 0] needs a row swap
        let row_ptr = [0, 1, 2];
        let col_ind = [1, 0];
        let values = [1.0, 1.0];
        let rhs = [3.0, 4.0];
        let mut x = [0.0; 2];

        let mut solver = DenseLu::new();
        solver.analyze(2, &row_ptr, &col_ind).unwrap();
        solver.factor(&row_ptr, &col_ind, &values).unwrap();
        solver.solve(&rhs, &mut x).unwrap();

        assert!((x[0] - 4.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_dense_detects_singular() {
        // second row is zero
        let row_ptr = [0, 2, 2];
        let col_ind = [0, 1];
        let values = [1.0, 1.0];

        let mut solver = DenseLu::new();
        solver.analyze(2, &row_ptr, &col_ind).unwrap();
        assert!(matches!(
            solver.factor(&row_ptr, &col_ind, &values),
            Err(SolverError::Singular(_))
        ));
    }

    #[test]
    fn test_solve_requires_factor() {
        let mut solver = DenseLu::new();
        solver.analyze(1, &[0, 1], &[0]).unwrap();
        let mut x = [0.0];
        assert!(matches!(
            solver.solve(&[1.0], &mut x),
            Err(SolverError::NotFactored)
        ));
    }

    #[test]
    fn test_pattern_validation() {
        let mut solver = DenseLu::new();
        assert!(solver.analyze(2, &[0, 1], &[0]).is_err());
        assert!(solver.analyze(1, &[0, 1], &[3]).is_err());
    }

    #[test]
    fn test_refactor_with_new_values() {
        let row_ptr = [0, 1, 2];
        let col_ind = [0, 1];
        let mut solver = DenseLu::new();
        solver.analyze(2, &row_ptr, &col_ind).unwrap();

        let mut x = [0.0; 2];
        solver.factor(&row_ptr, &col_ind, &[2.0, 2.0]).unwrap();
        solver.solve(&[2.0, 4.0], &mut x).unwrap();
        assert_eq!(x, [1.0, 2.0]);

        solver.factor(&row_ptr, &col_ind, &[4.0, 8.0]).unwrap();
        solver.solve(&[2.0, 4.0], &mut x).unwrap();
        assert_eq!(x, [0.5, 0.5]);
    }

    #[test]
    fn test_default_solver_picks_by_size() {
        assert_eq!(default_solver(8).name(), "dense-lu");
        assert_eq!(default_solver(1000).name(), "sparse-lu");
    }
}
