//! Native sparse LU factorization over a fixed CSR pattern.
//!
//! Circuit Jacobians are sparse, nearly diagonal-dominant and keep the
//! same pattern for every Newton iteration, so the solver splits the
//! work into a one-time symbolic analysis and a cheap repeated numeric
//! phase:
//!
//! 1. **Analyze** - transpose the CSR pattern into CSC form and compute
//!    the fill-in pattern of the L and U factors by simulating the
//!    elimination column by column.
//! 2. **Factor** - left-looking numeric factorization: scatter one
//!    column of A into a work vector, subtract the contributions of
//!    every earlier column with a nonzero in this one, then split the
//!    result into U (above the diagonal) and L (below, scaled by the
//!    pivot).
//! 3. **Solve** - forward substitution through unit-lower L, backward
//!    substitution through U.
//!
//! The fill-reducing permutation was already applied to the pattern by
//! the entry table, so no reordering happens here. There is no numeric
//! pivoting either: a pivot at or below the threshold aborts the
//! factorization with [`SolverError::Singular`], which the Newton loop
//! reports as a failed iteration.

use crate::error::SolverError;
use crate::linear::{check_pattern, LinearSolver, PIVOT_TOL};

/// Sparse left-looking LU with cached symbolic analysis.
#[derive(Debug, Default)]
pub struct SparseLu {
    m: usize,

    // CSC mirror of the analyzed CSR pattern
    csc_ptr: Vec<usize>,
    csc_rows: Vec<usize>,
    /// For each CSC slot, the CSR value index it mirrors.
    csc_from_csr: Vec<usize>,

    // factor patterns (CSC, diagonal stored last in each U column)
    l_col_ptr: Vec<usize>,
    l_rows: Vec<usize>,
    u_col_ptr: Vec<usize>,
    u_rows: Vec<usize>,

    l_values: Vec<f64>,
    u_values: Vec<f64>,

    work: Vec<f64>,
    analyzed: bool,
    factored: bool,
}

impl SparseLu {
    pub fn new() -> Self {
        Self::default()
    }

    fn transpose_pattern(&mut self, m: usize, row_ptr: &[usize], col_ind: &[usize]) {
        let nnz = col_ind.len();
        self.csc_ptr = vec![0; m + 1];
        self.csc_rows = vec![0; nnz];
        self.csc_from_csr = vec![0; nnz];

        for &col in col_ind {
            self.csc_ptr[col + 1] += 1;
        }
        for col in 0..m {
            self.csc_ptr[col + 1] += self.csc_ptr[col];
        }

        let mut next = self.csc_ptr.clone();
        for row in 0..m {
            for k in row_ptr[row]..row_ptr[row + 1] {
                let dst = next[col_ind[k]];
                self.csc_rows[dst] = row;
                self.csc_from_csr[dst] = k;
                next[col_ind[k]] += 1;
            }
        }
    }

    /// Simulate the elimination to find the fill-in pattern of L and U.
    fn symbolic_analysis(&mut self) {
        let m = self.m;
        let mut l_cols: Vec<Vec<usize>> = vec![Vec::new(); m];
        let mut u_cols: Vec<Vec<usize>> = vec![Vec::new(); m];

        let mut marked = vec![usize::MAX; m];
        let mut pattern: Vec<usize> = Vec::with_capacity(m);

        for k in 0..m {
            pattern.clear();
            for &row in &self.csc_rows[self.csc_ptr[k]..self.csc_ptr[k + 1]] {
                if row != k && marked[row] != k {
                    marked[row] = k;
                    pattern.push(row);
                }
            }

            // every above-diagonal entry pulls in the L pattern of its
            // column, transitively
            let mut i = 0;
            while i < pattern.len() {
                let row = pattern[i];
                if row < k {
                    for &fill in &l_cols[row] {
                        if marked[fill] != k {
                            marked[fill] = k;
                            pattern.push(fill);
                        }
                    }
                }
                i += 1;
            }

            pattern.sort_unstable();
            for &row in pattern.iter() {
                if row < k {
                    u_cols[k].push(row);
                } else if row > k {
                    l_cols[k].push(row);
                }
            }
        }

        self.l_col_ptr = vec![0; m + 1];
        self.u_col_ptr = vec![0; m + 1];
        self.l_rows.clear();
        self.u_rows.clear();

        for k in 0..m {
            self.l_rows.extend_from_slice(&l_cols[k]);
            self.l_col_ptr[k + 1] = self.l_rows.len();

            self.u_rows.extend_from_slice(&u_cols[k]);
            self.u_rows.push(k); // diagonal last
            self.u_col_ptr[k + 1] = self.u_rows.len();
        }

        self.l_values = vec![0.0; self.l_rows.len()];
        self.u_values = vec![0.0; self.u_rows.len()];
    }
}

impl LinearSolver for SparseLu {
    fn analyze(
        &mut self,
        m: usize,
        row_ptr: &[usize],
        col_ind: &[usize],
    ) -> Result<(), SolverError> {
        check_pattern(m, row_ptr, col_ind)?;

        self.m = m;
        self.factored = false;
        self.transpose_pattern(m, row_ptr, col_ind);
        self.symbolic_analysis();
        self.work = vec![0.0; m];
        self.analyzed = true;

        log::debug!(
            "sparse-lu analyzed: m={m}, nnz(A)={}, nnz(L)={}, nnz(U)={}",
            col_ind.len(),
            self.l_rows.len(),
            self.u_rows.len()
        );
        Ok(())
    }

    fn factor(
        &mut self,
        _row_ptr: &[usize],
        _col_ind: &[usize],
        values: &[f64],
    ) -> Result<(), SolverError> {
        if !self.analyzed {
            return Err(SolverError::NotFactored);
        }
        self.factored = false;

        for k in 0..self.m {
            // scatter column k of A
            for idx in self.csc_ptr[k]..self.csc_ptr[k + 1] {
                self.work[self.csc_rows[idx]] += values[self.csc_from_csr[idx]];
            }

            // subtract contributions of earlier columns; U rows are
            // ascending, so each work[j] is final when read
            let u_start = self.u_col_ptr[k];
            let u_diag = self.u_col_ptr[k + 1] - 1;
            for u_idx in u_start..u_diag {
                let j = self.u_rows[u_idx];
                let u_jk = self.work[j];
                self.u_values[u_idx] = u_jk;
                if u_jk != 0.0 {
                    for l_idx in self.l_col_ptr[j]..self.l_col_ptr[j + 1] {
                        self.work[self.l_rows[l_idx]] -= self.l_values[l_idx] * u_jk;
                    }
                }
            }

            let pivot = self.work[k];
            if pivot.abs() <= PIVOT_TOL {
                // leave a clean slate before bailing out
                for idx in self.u_col_ptr[k]..u_diag {
                    self.work[self.u_rows[idx]] = 0.0;
                }
                for idx in self.l_col_ptr[k]..self.l_col_ptr[k + 1] {
                    self.work[self.l_rows[idx]] = 0.0;
                }
                self.work[k] = 0.0;
                return Err(SolverError::Singular(k));
            }
            self.u_values[u_diag] = pivot;

            for l_idx in self.l_col_ptr[k]..self.l_col_ptr[k + 1] {
                let row = self.l_rows[l_idx];
                self.l_values[l_idx] = self.work[row] / pivot;
                self.work[row] = 0.0;
            }
            for u_idx in u_start..u_diag {
                self.work[self.u_rows[u_idx]] = 0.0;
            }
            self.work[k] = 0.0;
        }

        self.factored = true;
        Ok(())
    }

    fn solve(&mut self, rhs: &[f64], x: &mut [f64]) -> Result<(), SolverError> {
        if !self.factored {
            return Err(SolverError::NotFactored);
        }
        if rhs.len() != self.m || x.len() != self.m {
            return Err(SolverError::InvalidSystem(format!(
                "rhs of length {} against {} unknowns",
                rhs.len(),
                self.m
            )));
        }
        x.copy_from_slice(rhs);

        // forward: L z = b, unit diagonal, column-oriented scatter
        for k in 0..self.m {
            let z_k = x[k];
            if z_k != 0.0 {
                for l_idx in self.l_col_ptr[k]..self.l_col_ptr[k + 1] {
                    x[self.l_rows[l_idx]] -= self.l_values[l_idx] * z_k;
                }
            }
        }

        // backward: U x = z, diagonal stored last per column
        for k in (0..self.m).rev() {
            let u_diag = self.u_col_ptr[k + 1] - 1;
            x[k] /= self.u_values[u_diag];
            let x_k = x[k];
            if x_k != 0.0 {
                for u_idx in self.u_col_ptr[k]..u_diag {
                    x[self.u_rows[u_idx]] -= self.u_values[u_idx] * x_k;
                }
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "sparse-lu"
    }
}
