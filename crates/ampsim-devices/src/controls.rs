//! Host-controllable components.

use ampsim_core::{
    Classification, Component, EntryTable, MatrixEntry, Result, Signal, SignalBank, SparseSystem,
};

/// A potentiometer: two resistors in series with a wiper tap.
///
/// ```text
/// a ----[ pos·R ]---- wiper ----[ (1-pos)·R ]---- b
/// ```
///
/// The wiper position is a named control parameter in `[0, 1]`, read
/// from its shared [`Signal`] once per time step and clamped away from
/// the ends so neither half ever reaches zero resistance. Because the
/// host can turn the knob between any two samples, the potentiometer is
/// a dynamic component.
#[derive(Debug, Clone)]
pub struct Potentiometer {
    name: String,
    node_a: String,
    node_w: String,
    node_b: String,
    resistance: f64,
    param: String,
    position: Signal,

    aa: MatrixEntry,
    aw: MatrixEntry,
    wa: MatrixEntry,
    ww: MatrixEntry,
    wb: MatrixEntry,
    bw: MatrixEntry,
    bb: MatrixEntry,
}

/// Wiper travel is clamped to this margin from either end.
const POSITION_MARGIN: f64 = 1e-3;

impl Potentiometer {
    /// Create a potentiometer of `resistance` ohms total, controlled by
    /// the parameter `param` starting at `initial` (0 = full toward
    /// `a`, 1 = full toward `b`).
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        wiper: impl Into<String>,
        b: impl Into<String>,
        resistance: f64,
        param: impl Into<String>,
        initial: f64,
    ) -> Self {
        Self {
            name: name.into(),
            node_a: a.into(),
            node_w: wiper.into(),
            node_b: b.into(),
            resistance,
            param: param.into(),
            position: Signal::new(initial),
            aa: MatrixEntry::default(),
            aw: MatrixEntry::default(),
            wa: MatrixEntry::default(),
            ww: MatrixEntry::default(),
            wb: MatrixEntry::default(),
            bw: MatrixEntry::default(),
            bb: MatrixEntry::default(),
        }
    }
}

impl Component for Potentiometer {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::DYNAMIC
    }

    fn register(&mut self, table: &mut EntryTable, signals: &mut SignalBank) {
        table.register_node(&self.node_a);
        table.register_node(&self.node_w);
        table.register_node(&self.node_b);

        table.register_entry(&self.node_a, &self.node_a);
        table.register_entry(&self.node_a, &self.node_w);
        table.register_entry(&self.node_w, &self.node_a);
        table.register_entry(&self.node_w, &self.node_w);
        table.register_entry(&self.node_w, &self.node_b);
        table.register_entry(&self.node_b, &self.node_w);
        table.register_entry(&self.node_b, &self.node_b);

        self.position = signals.register_param(&self.param, self.position.get());
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.aa = system.matrix_entry(&self.node_a, &self.node_a)?;
        self.aw = system.matrix_entry(&self.node_a, &self.node_w)?;
        self.wa = system.matrix_entry(&self.node_w, &self.node_a)?;
        self.ww = system.matrix_entry(&self.node_w, &self.node_w)?;
        self.wb = system.matrix_entry(&self.node_w, &self.node_b)?;
        self.bw = system.matrix_entry(&self.node_b, &self.node_w)?;
        self.bb = system.matrix_entry(&self.node_b, &self.node_b)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        let pos = self
            .position
            .get()
            .clamp(POSITION_MARGIN, 1.0 - POSITION_MARGIN);
        let g1 = 1.0 / (pos * self.resistance);
        let g2 = 1.0 / ((1.0 - pos) * self.resistance);

        system.add_a(self.aa, g1);
        system.add_a(self.aw, -g1);
        system.add_a(self.wa, -g1);
        system.add_a(self.ww, g1 + g2);
        system.add_a(self.wb, -g2);
        system.add_a(self.bw, -g2);
        system.add_a(self.bb, g2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampsim_core::Layer;

    fn assemble(pot: &mut Potentiometer) -> (SparseSystem, SignalBank) {
        let mut table = EntryTable::new();
        let mut signals = SignalBank::new();
        pot.register(&mut table, &mut signals);
        table.freeze().unwrap();
        let mut system = SparseSystem::new(table);
        pot.bind(&system).unwrap();
        system.set_active(Layer::Dynamic);
        (system, signals)
    }

    #[test]
    fn test_midpoint_split() {
        let mut pot = Potentiometer::new("P1", "1", "2", "0", 10e3, "level", 0.5);
        let (mut system, _signals) = assemble(&mut pot);
        pot.fill(&mut system);

        let table = system.table();
        let a = system.layer_a(Layer::Dynamic);
        let g = 1.0 / 5e3;
        assert!((a[table.offset("1", "1").unwrap()] - g).abs() < 1e-12);
        assert!((a[table.offset("2", "2").unwrap()] - 2.0 * g).abs() < 1e-12);
    }

    #[test]
    fn test_knob_moves_between_fills() {
        let mut pot = Potentiometer::new("P1", "1", "2", "0", 10e3, "level", 0.5);
        let (mut system, signals) = assemble(&mut pot);

        signals.param("level").unwrap().set(0.25);
        pot.fill(&mut system);

        let table = system.table();
        let a = system.layer_a(Layer::Dynamic);
        let g1 = 1.0 / 2.5e3;
        assert!((a[table.offset("1", "1").unwrap()] - g1).abs() < 1e-12);
    }

    #[test]
    fn test_position_is_clamped() {
        let mut pot = Potentiometer::new("P1", "1", "2", "0", 10e3, "level", 0.0);
        let (mut system, _signals) = assemble(&mut pot);
        pot.fill(&mut system);

        // no infinities even with the knob hard against the stop
        for &v in system.layer_a(Layer::Dynamic) {
            assert!(v.is_finite());
        }
    }
}
