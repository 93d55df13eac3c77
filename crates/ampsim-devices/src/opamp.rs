//! Ideal operational amplifier.

use ampsim_core::{
    node, Classification, Component, EntryTable, MatrixEntry, Result, SignalBank, SparseSystem,
};

/// An ideal op-amp (nullor): output between `a` and `b`, inputs `c`
/// (non-inverting) and `d` (inverting).
///
/// The model assumes stable linear operation and enforces `v(c) = v(d)`
/// through an auxiliary branch current that the output nodes absorb.
#[derive(Debug, Clone)]
pub struct OpAmp {
    name: String,
    out_a: String,
    out_b: String,
    in_c: String,
    in_d: String,
    node_j: String,

    aj: MatrixEntry,
    bj: MatrixEntry,
    jc: MatrixEntry,
    jd: MatrixEntry,
}

impl OpAmp {
    pub fn new(
        name: impl Into<String>,
        out_a: impl Into<String>,
        out_b: impl Into<String>,
        in_c: impl Into<String>,
        in_d: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let node_j = node::branch_node(&name);
        Self {
            name,
            out_a: out_a.into(),
            out_b: out_b.into(),
            in_c: in_c.into(),
            in_d: in_d.into(),
            node_j,
            aj: MatrixEntry::default(),
            bj: MatrixEntry::default(),
            jc: MatrixEntry::default(),
            jd: MatrixEntry::default(),
        }
    }
}

impl Component for OpAmp {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::STATIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        for n in [
            &self.out_a,
            &self.out_b,
            &self.in_c,
            &self.in_d,
            &self.node_j,
        ] {
            table.register_node(n);
        }

        table.register_entry(&self.out_a, &self.node_j);
        table.register_entry(&self.out_b, &self.node_j);
        table.register_entry(&self.node_j, &self.in_c);
        table.register_entry(&self.node_j, &self.in_d);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.aj = system.matrix_entry(&self.out_a, &self.node_j)?;
        self.bj = system.matrix_entry(&self.out_b, &self.node_j)?;
        self.jc = system.matrix_entry(&self.node_j, &self.in_c)?;
        self.jd = system.matrix_entry(&self.node_j, &self.in_d)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        system.add_a(self.aj, 1.0);
        system.add_a(self.bj, -1.0);
        system.add_a(self.jc, 1.0);
        system.add_a(self.jd, -1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampsim_core::Layer;

    #[test]
    fn test_nullor_pattern() {
        let mut op = OpAmp::new("U1", "out", "0", "p", "n");
        let mut table = EntryTable::new();
        let mut signals = SignalBank::new();
        op.register(&mut table, &mut signals);
        table.freeze().unwrap();
        let mut system = SparseSystem::new(table);
        op.bind(&system).unwrap();

        system.set_active(Layer::Static);
        op.fill(&mut system);

        let table = system.table();
        let a = system.layer_a(Layer::Static);
        assert_eq!(a[table.offset("out", "@JU1").unwrap()], 1.0);
        assert_eq!(a[table.offset("@JU1", "p").unwrap()], 1.0);
        assert_eq!(a[table.offset("@JU1", "n").unwrap()], -1.0);
    }

    #[test]
    fn test_grounded_noninverting_input() {
        // inverting stages tie the + input to ground; the row must
        // still bind (to the sentinel) without registering a pattern
        let mut op = OpAmp::new("U1", "out", "0", "0", "fb");
        let mut table = EntryTable::new();
        let mut signals = SignalBank::new();
        op.register(&mut table, &mut signals);
        table.freeze().unwrap();
        let system = SparseSystem::new(table);
        assert!(op.bind(&system).is_ok());
    }
}
