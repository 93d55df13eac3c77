//! Linear resistor.

use ampsim_core::{
    Classification, Component, EntryTable, MatrixEntry, Result, SignalBank, SparseSystem,
};

/// A linear resistor between two nodes.
#[derive(Debug, Clone)]
pub struct Resistor {
    name: String,
    node_a: String,
    node_b: String,
    conductance: f64,

    aa: MatrixEntry,
    ab: MatrixEntry,
    ba: MatrixEntry,
    bb: MatrixEntry,
}

impl Resistor {
    /// Create a resistor of `resistance` ohms between `a` and `b`.
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        resistance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            node_a: a.into(),
            node_b: b.into(),
            conductance: 1.0 / resistance,
            aa: MatrixEntry::default(),
            ab: MatrixEntry::default(),
            ba: MatrixEntry::default(),
            bb: MatrixEntry::default(),
        }
    }

    pub fn conductance(&self) -> f64 {
        self.conductance
    }
}

impl Component for Resistor {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::STATIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        table.register_node(&self.node_a);
        table.register_node(&self.node_b);

        table.register_entry(&self.node_a, &self.node_a);
        table.register_entry(&self.node_a, &self.node_b);
        table.register_entry(&self.node_b, &self.node_a);
        table.register_entry(&self.node_b, &self.node_b);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.aa = system.matrix_entry(&self.node_a, &self.node_a)?;
        self.ab = system.matrix_entry(&self.node_a, &self.node_b)?;
        self.ba = system.matrix_entry(&self.node_b, &self.node_a)?;
        self.bb = system.matrix_entry(&self.node_b, &self.node_b)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        let g = self.conductance;
        system.add_a(self.aa, g);
        system.add_a(self.ab, -g);
        system.add_a(self.ba, -g);
        system.add_a(self.bb, g);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampsim_core::Layer;

    fn assemble(component: &mut dyn Component) -> SparseSystem {
        let mut table = EntryTable::new();
        let mut signals = SignalBank::new();
        component.register(&mut table, &mut signals);
        table.freeze().unwrap();
        SparseSystem::new(table)
    }

    #[test]
    fn test_resistor_stamp() {
        let mut r = Resistor::new("R1", "1", "2", 1000.0);
        let mut system = assemble(&mut r);
        r.bind(&system).unwrap();

        system.set_active(Layer::Static);
        r.fill(&mut system);

        let g = 1e-3;
        let table = system.table();
        let values = system.layer_a(Layer::Static);
        assert!((values[table.offset("1", "1").unwrap()] - g).abs() < 1e-15);
        assert!((values[table.offset("2", "2").unwrap()] - g).abs() < 1e-15);
        assert!((values[table.offset("1", "2").unwrap()] + g).abs() < 1e-15);
        assert!((values[table.offset("2", "1").unwrap()] + g).abs() < 1e-15);
    }

    #[test]
    fn test_resistor_to_ground() {
        let mut r = Resistor::new("R1", "1", "0", 100.0);
        let mut system = assemble(&mut r);
        r.bind(&system).unwrap();

        system.set_active(Layer::Static);
        r.fill(&mut system);

        // only the (1,1) cell exists; the rest hit the ground sentinel
        assert_eq!(system.num_entries(), 1);
        assert!((system.layer_a(Layer::Static)[0] - 0.01).abs() < 1e-15);
    }

    #[test]
    fn test_stamps_accumulate() {
        let mut r1 = Resistor::new("R1", "1", "0", 100.0);
        let mut table = EntryTable::new();
        let mut signals = SignalBank::new();
        r1.register(&mut table, &mut signals);
        let mut r2 = Resistor::new("R2", "1", "0", 100.0);
        r2.register(&mut table, &mut signals);
        table.freeze().unwrap();

        let mut system = SparseSystem::new(table);
        r1.bind(&system).unwrap();
        r2.bind(&system).unwrap();
        r1.fill(&mut system);
        r2.fill(&mut system);

        // two 100 ohm resistors in parallel
        assert!((system.layer_a(Layer::Static)[0] - 0.02).abs() < 1e-15);
    }
}
