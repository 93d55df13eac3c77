//! Node directory and sparsity registry.
//!
//! During the build phase every component announces the node names it
//! references and the matrix positions it will stamp. [`EntryTable`]
//! deduplicates both, silently dropping anything that touches ground.
//! Freezing the table assigns provisional node indices (lexicographic
//! over names, so rebuilds are deterministic), lays the entries out as a
//! CSR pattern and gives each entry a storage offset. A fill-reducing
//! symmetric permutation may then be applied; it remaps the node indices
//! and relocates every offset, after which the table is immutable.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::node;

/// Interned node directory plus the registered sparsity pattern.
#[derive(Debug, Default)]
pub struct EntryTable {
    /// Node name to matrix index (provisional after freeze, final after
    /// permutation).
    nodes: BTreeMap<String, usize>,
    /// Registered `(row, col)` positions and their storage offsets.
    entries: BTreeMap<(String, String), usize>,
    /// CSR row-start array, length `m + 1`.
    row_ptr: Vec<usize>,
    /// CSR column indices, length `nnz`.
    col_ind: Vec<usize>,
    frozen: bool,
}

impl EntryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node name to the directory. Ground is ignored.
    pub fn register_node(&mut self, name: &str) {
        debug_assert!(!self.frozen, "register_node after freeze");
        if node::is_ground(name) {
            return;
        }
        self.nodes.entry(name.to_string()).or_insert(0);
    }

    /// Add a matrix position to the registry. Positions with a ground
    /// row or column are ignored; the ground sentinel handles them.
    pub fn register_entry(&mut self, row: &str, col: &str) {
        debug_assert!(!self.frozen, "register_entry after freeze");
        if node::is_ground(row) || node::is_ground(col) {
            return;
        }
        self.entries
            .entry((row.to_string(), col.to_string()))
            .or_insert(0);
    }

    /// Close registration: assign provisional indices and build the CSR
    /// pattern.
    ///
    /// Fails with [`Error::InvalidPattern`] if any registered entry
    /// references a node name that was never registered.
    pub fn freeze(&mut self) -> Result<()> {
        debug_assert!(!self.frozen, "freeze called twice");

        for ((row, col), _) in self.entries.iter() {
            if !self.nodes.contains_key(row) || !self.nodes.contains_key(col) {
                return Err(Error::InvalidPattern {
                    row: row.clone(),
                    col: col.clone(),
                });
            }
        }

        // provisional indices in lexicographic name order
        for (index, (_, slot)) in self.nodes.iter_mut().enumerate() {
            *slot = index;
        }

        self.rebuild_pattern();
        self.frozen = true;

        log::debug!(
            "entry table frozen: {} nodes, {} entries",
            self.num_nodes(),
            self.num_entries()
        );
        Ok(())
    }

    /// Apply a symmetric permutation `P A Pᵀ` with `perm[old] = new`.
    ///
    /// Node indices are remapped, the CSR arrays are rebuilt with
    /// columns sorted ascending in the new index space, and every
    /// entry's offset is relocated.
    pub fn permute(&mut self, perm: &[usize]) -> Result<()> {
        let m = self.num_nodes();
        if perm.len() != m || !is_bijection(perm) {
            return Err(Error::Solver(format!(
                "permutation of length {} is not a bijection over {m} nodes",
                perm.len()
            )));
        }

        for slot in self.nodes.values_mut() {
            *slot = perm[*slot];
        }
        self.rebuild_pattern();
        Ok(())
    }

    /// Lay out `row_ptr`/`col_ind` from the current node indices and
    /// assign each entry its offset.
    fn rebuild_pattern(&mut self) {
        let m = self.nodes.len();
        let nnz = self.entries.len();

        let mut coords: Vec<(usize, usize, (String, String))> = self
            .entries
            .keys()
            .map(|key| (self.nodes[&key.0], self.nodes[&key.1], key.clone()))
            .collect();
        coords.sort_unstable_by_key(|entry| (entry.0, entry.1));

        self.row_ptr = vec![0; m + 1];
        self.col_ind = Vec::with_capacity(nnz);

        for (offset, (row, col, key)) in coords.into_iter().enumerate() {
            self.row_ptr[row + 1] += 1;
            self.col_ind.push(col);
            if let Some(slot) = self.entries.get_mut(&key) {
                *slot = offset;
            }
        }
        for row in 0..m {
            self.row_ptr[row + 1] += self.row_ptr[row];
        }

        debug_assert_eq!(self.row_ptr[m], nnz, "row filling failure");
    }

    /// Final index of a non-ground node, if registered.
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.get(name).copied()
    }

    /// Storage offset of a registered entry.
    pub fn offset(&self, row: &str, col: &str) -> Option<usize> {
        self.entries
            .get(&(row.to_string(), col.to_string()))
            .copied()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Name-to-index directory, for introspection and tests.
    pub fn nodes(&self) -> &BTreeMap<String, usize> {
        &self.nodes
    }

    /// Entry-to-offset registry, for introspection and tests.
    pub fn entries(&self) -> &BTreeMap<(String, String), usize> {
        &self.entries
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_ind(&self) -> &[usize] {
        &self.col_ind
    }
}

fn is_bijection(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divider_table() -> EntryTable {
        // V1 (1,0), R1 (1,2), R2 (2,0) style pattern without the branch
        let mut table = EntryTable::new();
        for name in ["1", "2"] {
            table.register_node(name);
        }
        table.register_entry("1", "1");
        table.register_entry("1", "2");
        table.register_entry("2", "1");
        table.register_entry("2", "2");
        table
    }

    #[test]
    fn test_ground_is_dropped() {
        let mut table = EntryTable::new();
        table.register_node("0");
        table.register_node("1");
        table.register_entry("1", "0");
        table.register_entry("0", "1");
        table.register_entry("1", "1");
        table.freeze().unwrap();

        assert_eq!(table.num_nodes(), 1);
        assert_eq!(table.num_entries(), 1);
        assert!(table.node_index("0").is_none());
    }

    #[test]
    fn test_registration_deduplicates() {
        let mut table = divider_table();
        table.register_node("1");
        table.register_entry("1", "2");
        table.freeze().unwrap();
        assert_eq!(table.num_nodes(), 2);
        assert_eq!(table.num_entries(), 4);
    }

    #[test]
    fn test_lexicographic_indices() {
        let mut table = EntryTable::new();
        for name in ["out", "2", "in", "10"] {
            table.register_node(name);
            table.register_entry(name, name);
        }
        table.freeze().unwrap();

        // string order: "10" < "2" < "in" < "out"
        assert_eq!(table.node_index("10"), Some(0));
        assert_eq!(table.node_index("2"), Some(1));
        assert_eq!(table.node_index("in"), Some(2));
        assert_eq!(table.node_index("out"), Some(3));
    }

    #[test]
    fn test_csr_invariants() {
        let mut table = divider_table();
        table.freeze().unwrap();

        let m = table.num_nodes();
        let nnz = table.num_entries();
        assert_eq!(table.row_ptr()[m], nnz);

        // every entry's offset lands in its row slice, at its column
        for ((row, col), &offset) in table.entries() {
            let r = table.node_index(row).unwrap();
            let c = table.node_index(col).unwrap();
            assert!(table.row_ptr()[r] <= offset && offset < table.row_ptr()[r + 1]);
            assert_eq!(table.col_ind()[offset], c);
        }

        // columns sorted ascending within each row
        for r in 0..m {
            let cols = &table.col_ind()[table.row_ptr()[r]..table.row_ptr()[r + 1]];
            assert!(cols.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_unregistered_node_in_entry_fails() {
        let mut table = EntryTable::new();
        table.register_node("1");
        table.register_entry("1", "7");
        let err = table.freeze().unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_permutation_relocates_offsets() {
        let mut table = divider_table();
        table.freeze().unwrap();
        table.permute(&[1, 0]).unwrap();

        assert_eq!(table.node_index("1"), Some(1));
        assert_eq!(table.node_index("2"), Some(0));

        for ((row, col), &offset) in table.entries() {
            let r = table.node_index(row).unwrap();
            let c = table.node_index(col).unwrap();
            assert!(table.row_ptr()[r] <= offset && offset < table.row_ptr()[r + 1]);
            assert_eq!(table.col_ind()[offset], c);
        }
    }

    #[test]
    fn test_permutation_must_be_bijective() {
        let mut table = divider_table();
        table.freeze().unwrap();
        assert!(table.permute(&[0, 0]).is_err());
        assert!(table.permute(&[0]).is_err());
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let mut a = divider_table();
        let mut b = divider_table();
        a.freeze().unwrap();
        b.freeze().unwrap();
        assert_eq!(a.row_ptr(), b.row_ptr());
        assert_eq!(a.col_ind(), b.col_ind());
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.entries(), b.entries());
    }
}
