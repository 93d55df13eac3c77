//! Fill-reducing ordering for the frozen sparsity pattern.
//!
//! Classic minimum-degree over the symmetrized pattern `A + Aᵀ`: at
//! each step the remaining node with the fewest connections is
//! eliminated and its neighborhood is turned into a clique, simulating
//! the fill-in of Gaussian elimination. Ties break toward the smallest
//! index so the ordering is deterministic.
//!
//! The result is best-effort; the only contract is that it returns a
//! bijection, which the entry table verifies before applying it.

use std::collections::BTreeSet;

/// Compute an elimination order with `perm[old] = new`.
pub fn min_degree(m: usize, row_ptr: &[usize], col_ind: &[usize]) -> Vec<usize> {
    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); m];
    for row in 0..m {
        for &col in &col_ind[row_ptr[row]..row_ptr[row + 1]] {
            if col != row && col < m {
                adjacency[row].insert(col);
                adjacency[col].insert(row);
            }
        }
    }

    let mut perm = vec![0; m];
    let mut alive = vec![true; m];

    for step in 0..m {
        let Some(pivot) = (0..m)
            .filter(|&node| alive[node])
            .min_by_key(|&node| (adjacency[node].len(), node))
        else {
            break;
        };

        perm[pivot] = step;
        alive[pivot] = false;

        let neighbors: Vec<usize> = adjacency[pivot].iter().copied().collect();
        for (i, &u) in neighbors.iter().enumerate() {
            adjacency[u].remove(&pivot);
            for &v in &neighbors[i + 1..] {
                adjacency[u].insert(v);
                adjacency[v].insert(u);
            }
        }
        adjacency[pivot].clear();
    }

    perm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_bijection(perm: &[usize]) {
        let mut seen = vec![false; perm.len()];
        for &p in perm {
            assert!(p < perm.len());
            assert!(!seen[p], "duplicate position {p}");
            seen[p] = true;
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert!(min_degree(0, &[0], &[]).is_empty());
        assert_eq!(min_degree(1, &[0, 1], &[0]), vec![0]);
    }

    #[test]
    fn test_star_eliminates_leaves_first() {
        // node 0 connected to 1, 2, 3
        let row_ptr = [0, 4, 6, 8, 10];
        let col_ind = [0, 1, 2, 3, 0, 1, 0, 2, 0, 3];
        let perm = min_degree(4, &row_ptr, &col_ind);
        check_bijection(&perm);
        // the hub must go last
        assert_eq!(perm[0], 3);
    }

    #[test]
    fn test_chain() {
        // 0-1-2-3-4
        let row_ptr = [0, 2, 5, 8, 11, 13];
        let col_ind = [0, 1, 0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4];
        let perm = min_degree(5, &row_ptr, &col_ind);
        check_bijection(&perm);
        // an endpoint is eliminated before the middle
        assert!(perm[0] < perm[2] || perm[4] < perm[2]);
    }

    #[test]
    fn test_asymmetric_pattern_is_symmetrized() {
        // only (0,1) present; (1,0) implied by A + At
        let row_ptr = [0, 2, 3];
        let col_ind = [0, 1, 1];
        let perm = min_degree(2, &row_ptr, &col_ind);
        check_bijection(&perm);
    }
}
