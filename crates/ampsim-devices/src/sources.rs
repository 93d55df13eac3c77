//! Independent and controlled sources.
//!
//! Voltage-defining elements introduce one auxiliary branch-current
//! unknown (a node named with the `@J` convention) and stamp the
//! classical MNA patterns. Independent sources are driven by a
//! [`Waveform`]; a DC waveform makes the source static, anything else
//! makes it dynamic so it is refreshed once per time step.

use ampsim_core::{
    node, Classification, Component, EntryTable, MatrixEntry, Result, RhsEntry, SignalBank,
    SparseSystem,
};

use crate::waveforms::Waveform;

/// An independent current source from `a` to `b`.
///
/// Positive current is injected into `b`.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    name: String,
    node_a: String,
    node_b: String,
    waveform: Waveform,

    rhs_a: RhsEntry,
    rhs_b: RhsEntry,
}

impl CurrentSource {
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        waveform: Waveform,
    ) -> Self {
        Self {
            name: name.into(),
            node_a: a.into(),
            node_b: b.into(),
            waveform,
            rhs_a: RhsEntry::default(),
            rhs_b: RhsEntry::default(),
        }
    }

    /// Constant current source of `amps`.
    pub fn dc(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        amps: f64,
    ) -> Self {
        Self::new(name, a, b, Waveform::dc(amps))
    }
}

impl Component for CurrentSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        if self.waveform.is_time_invariant() {
            Classification::STATIC
        } else {
            Classification::DYNAMIC
        }
    }

    fn register(&mut self, table: &mut EntryTable, signals: &mut SignalBank) {
        table.register_node(&self.node_a);
        table.register_node(&self.node_b);
        self.waveform.attach(signals);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.rhs_a = system.rhs_entry(&self.node_a)?;
        self.rhs_b = system.rhs_entry(&self.node_b)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        let i = self.waveform.value_at(system.time);
        system.add_b(self.rhs_a, -i);
        system.add_b(self.rhs_b, i);
    }
}

/// An independent voltage source: `v(a) - v(b) = V(t)`.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    name: String,
    node_a: String,
    node_b: String,
    node_j: String,
    waveform: Waveform,

    aj: MatrixEntry,
    bj: MatrixEntry,
    ja: MatrixEntry,
    jb: MatrixEntry,
    rhs_j: RhsEntry,
}

impl VoltageSource {
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        waveform: Waveform,
    ) -> Self {
        let name = name.into();
        let node_j = node::branch_node(&name);
        Self {
            name,
            node_a: a.into(),
            node_b: b.into(),
            node_j,
            waveform,
            aj: MatrixEntry::default(),
            bj: MatrixEntry::default(),
            ja: MatrixEntry::default(),
            jb: MatrixEntry::default(),
            rhs_j: RhsEntry::default(),
        }
    }

    /// Constant voltage source of `volts`.
    pub fn dc(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        volts: f64,
    ) -> Self {
        Self::new(name, a, b, Waveform::dc(volts))
    }
}

impl Component for VoltageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        if self.waveform.is_time_invariant() {
            Classification::STATIC
        } else {
            Classification::DYNAMIC
        }
    }

    fn register(&mut self, table: &mut EntryTable, signals: &mut SignalBank) {
        table.register_node(&self.node_a);
        table.register_node(&self.node_b);
        table.register_node(&self.node_j);

        table.register_entry(&self.node_a, &self.node_j);
        table.register_entry(&self.node_b, &self.node_j);
        table.register_entry(&self.node_j, &self.node_a);
        table.register_entry(&self.node_j, &self.node_b);

        self.waveform.attach(signals);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.aj = system.matrix_entry(&self.node_a, &self.node_j)?;
        self.bj = system.matrix_entry(&self.node_b, &self.node_j)?;
        self.ja = system.matrix_entry(&self.node_j, &self.node_a)?;
        self.jb = system.matrix_entry(&self.node_j, &self.node_b)?;
        self.rhs_j = system.rhs_entry(&self.node_j)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        let v = self.waveform.value_at(system.time);
        system.add_a(self.aj, 1.0);
        system.add_a(self.bj, -1.0);
        system.add_a(self.ja, -1.0);
        system.add_a(self.jb, 1.0);
        system.add_b(self.rhs_j, -v);
    }
}

/// Voltage-controlled voltage source: `v(a) - v(b) = gain·(v(c) - v(d))`.
#[derive(Debug, Clone)]
pub struct Vcvs {
    name: String,
    node_a: String,
    node_b: String,
    node_c: String,
    node_d: String,
    node_j: String,
    gain: f64,

    aj: MatrixEntry,
    bj: MatrixEntry,
    ja: MatrixEntry,
    jb: MatrixEntry,
    jc: MatrixEntry,
    jd: MatrixEntry,
}

impl Vcvs {
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        c: impl Into<String>,
        d: impl Into<String>,
        gain: f64,
    ) -> Self {
        let name = name.into();
        let node_j = node::branch_node(&name);
        Self {
            name,
            node_a: a.into(),
            node_b: b.into(),
            node_c: c.into(),
            node_d: d.into(),
            node_j,
            gain,
            aj: MatrixEntry::default(),
            bj: MatrixEntry::default(),
            ja: MatrixEntry::default(),
            jb: MatrixEntry::default(),
            jc: MatrixEntry::default(),
            jd: MatrixEntry::default(),
        }
    }
}

impl Component for Vcvs {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::STATIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        for n in [
            &self.node_a,
            &self.node_b,
            &self.node_c,
            &self.node_d,
            &self.node_j,
        ] {
            table.register_node(n);
        }

        table.register_entry(&self.node_a, &self.node_j);
        table.register_entry(&self.node_b, &self.node_j);
        table.register_entry(&self.node_j, &self.node_a);
        table.register_entry(&self.node_j, &self.node_b);
        table.register_entry(&self.node_j, &self.node_c);
        table.register_entry(&self.node_j, &self.node_d);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.aj = system.matrix_entry(&self.node_a, &self.node_j)?;
        self.bj = system.matrix_entry(&self.node_b, &self.node_j)?;
        self.ja = system.matrix_entry(&self.node_j, &self.node_a)?;
        self.jb = system.matrix_entry(&self.node_j, &self.node_b)?;
        self.jc = system.matrix_entry(&self.node_j, &self.node_c)?;
        self.jd = system.matrix_entry(&self.node_j, &self.node_d)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        system.add_a(self.aj, 1.0);
        system.add_a(self.bj, -1.0);
        system.add_a(self.ja, -1.0);
        system.add_a(self.jb, 1.0);
        system.add_a(self.jc, self.gain);
        system.add_a(self.jd, -self.gain);
    }
}

/// Voltage-controlled current source: `i(a→b) = gm·(v(c) - v(d))`.
#[derive(Debug, Clone)]
pub struct Vccs {
    name: String,
    node_a: String,
    node_b: String,
    node_c: String,
    node_d: String,
    gm: f64,

    ac: MatrixEntry,
    ad: MatrixEntry,
    bc: MatrixEntry,
    bd: MatrixEntry,
}

impl Vccs {
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        c: impl Into<String>,
        d: impl Into<String>,
        gm: f64,
    ) -> Self {
        Self {
            name: name.into(),
            node_a: a.into(),
            node_b: b.into(),
            node_c: c.into(),
            node_d: d.into(),
            gm,
            ac: MatrixEntry::default(),
            ad: MatrixEntry::default(),
            bc: MatrixEntry::default(),
            bd: MatrixEntry::default(),
        }
    }
}

impl Component for Vccs {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::STATIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        for n in [&self.node_a, &self.node_b, &self.node_c, &self.node_d] {
            table.register_node(n);
        }

        table.register_entry(&self.node_a, &self.node_c);
        table.register_entry(&self.node_a, &self.node_d);
        table.register_entry(&self.node_b, &self.node_c);
        table.register_entry(&self.node_b, &self.node_d);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.ac = system.matrix_entry(&self.node_a, &self.node_c)?;
        self.ad = system.matrix_entry(&self.node_a, &self.node_d)?;
        self.bc = system.matrix_entry(&self.node_b, &self.node_c)?;
        self.bd = system.matrix_entry(&self.node_b, &self.node_d)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        system.add_a(self.ac, self.gm);
        system.add_a(self.ad, -self.gm);
        system.add_a(self.bc, -self.gm);
        system.add_a(self.bd, self.gm);
    }
}

/// Current-controlled current source.
///
/// A zero-voltage sensing branch between `c` and `d` carries the
/// control current; `gain` times that current is injected into `a`/`b`.
#[derive(Debug, Clone)]
pub struct Cccs {
    name: String,
    node_a: String,
    node_b: String,
    node_c: String,
    node_d: String,
    node_j: String,
    gain: f64,

    aj: MatrixEntry,
    bj: MatrixEntry,
    cj: MatrixEntry,
    dj: MatrixEntry,
    jc: MatrixEntry,
    jd: MatrixEntry,
}

impl Cccs {
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        c: impl Into<String>,
        d: impl Into<String>,
        gain: f64,
    ) -> Self {
        let name = name.into();
        let node_j = node::branch_node(&name);
        Self {
            name,
            node_a: a.into(),
            node_b: b.into(),
            node_c: c.into(),
            node_d: d.into(),
            node_j,
            gain,
            aj: MatrixEntry::default(),
            bj: MatrixEntry::default(),
            cj: MatrixEntry::default(),
            dj: MatrixEntry::default(),
            jc: MatrixEntry::default(),
            jd: MatrixEntry::default(),
        }
    }
}

impl Component for Cccs {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::STATIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        for n in [
            &self.node_a,
            &self.node_b,
            &self.node_c,
            &self.node_d,
            &self.node_j,
        ] {
            table.register_node(n);
        }

        table.register_entry(&self.node_a, &self.node_j);
        table.register_entry(&self.node_b, &self.node_j);
        table.register_entry(&self.node_c, &self.node_j);
        table.register_entry(&self.node_d, &self.node_j);
        table.register_entry(&self.node_j, &self.node_c);
        table.register_entry(&self.node_j, &self.node_d);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.aj = system.matrix_entry(&self.node_a, &self.node_j)?;
        self.bj = system.matrix_entry(&self.node_b, &self.node_j)?;
        self.cj = system.matrix_entry(&self.node_c, &self.node_j)?;
        self.dj = system.matrix_entry(&self.node_d, &self.node_j)?;
        self.jc = system.matrix_entry(&self.node_j, &self.node_c)?;
        self.jd = system.matrix_entry(&self.node_j, &self.node_d)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        system.add_a(self.aj, self.gain);
        system.add_a(self.bj, -self.gain);
        system.add_a(self.cj, 1.0);
        system.add_a(self.dj, -1.0);
        system.add_a(self.jc, -1.0);
        system.add_a(self.jd, 1.0);
    }
}

/// Current-controlled voltage source (transresistance).
///
/// Uses two auxiliary branches: `x` senses the control current through
/// a zero-voltage branch between `c` and `d`, `y` drives the output
/// voltage `rm·i(x)` between `a` and `b`.
#[derive(Debug, Clone)]
pub struct Ccvs {
    name: String,
    node_a: String,
    node_b: String,
    node_c: String,
    node_d: String,
    node_x: String,
    node_y: String,
    rm: f64,

    ay: MatrixEntry,
    by: MatrixEntry,
    cx: MatrixEntry,
    dx: MatrixEntry,
    xc: MatrixEntry,
    xd: MatrixEntry,
    ya: MatrixEntry,
    yb: MatrixEntry,
    yx: MatrixEntry,
}

impl Ccvs {
    pub fn new(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        c: impl Into<String>,
        d: impl Into<String>,
        rm: f64,
    ) -> Self {
        let name = name.into();
        let node_x = format!("@Jx{name}");
        let node_y = format!("@Jy{name}");
        Self {
            name,
            node_a: a.into(),
            node_b: b.into(),
            node_c: c.into(),
            node_d: d.into(),
            node_x,
            node_y,
            rm,
            ay: MatrixEntry::default(),
            by: MatrixEntry::default(),
            cx: MatrixEntry::default(),
            dx: MatrixEntry::default(),
            xc: MatrixEntry::default(),
            xd: MatrixEntry::default(),
            ya: MatrixEntry::default(),
            yb: MatrixEntry::default(),
            yx: MatrixEntry::default(),
        }
    }
}

impl Component for Ccvs {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::STATIC
    }

    fn register(&mut self, table: &mut EntryTable, _signals: &mut SignalBank) {
        for n in [
            &self.node_a,
            &self.node_b,
            &self.node_c,
            &self.node_d,
            &self.node_x,
            &self.node_y,
        ] {
            table.register_node(n);
        }

        table.register_entry(&self.node_a, &self.node_y);
        table.register_entry(&self.node_b, &self.node_y);
        table.register_entry(&self.node_c, &self.node_x);
        table.register_entry(&self.node_d, &self.node_x);
        table.register_entry(&self.node_x, &self.node_c);
        table.register_entry(&self.node_x, &self.node_d);
        table.register_entry(&self.node_y, &self.node_a);
        table.register_entry(&self.node_y, &self.node_b);
        table.register_entry(&self.node_y, &self.node_x);
    }

    fn bind(&mut self, system: &SparseSystem) -> Result<()> {
        self.ay = system.matrix_entry(&self.node_a, &self.node_y)?;
        self.by = system.matrix_entry(&self.node_b, &self.node_y)?;
        self.cx = system.matrix_entry(&self.node_c, &self.node_x)?;
        self.dx = system.matrix_entry(&self.node_d, &self.node_x)?;
        self.xc = system.matrix_entry(&self.node_x, &self.node_c)?;
        self.xd = system.matrix_entry(&self.node_x, &self.node_d)?;
        self.ya = system.matrix_entry(&self.node_y, &self.node_a)?;
        self.yb = system.matrix_entry(&self.node_y, &self.node_b)?;
        self.yx = system.matrix_entry(&self.node_y, &self.node_x)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        system.add_a(self.ay, 1.0);
        system.add_a(self.by, -1.0);
        system.add_a(self.cx, 1.0);
        system.add_a(self.dx, -1.0);
        system.add_a(self.xc, -1.0);
        system.add_a(self.xd, 1.0);
        system.add_a(self.ya, -1.0);
        system.add_a(self.yb, 1.0);
        system.add_a(self.yx, self.rm);
    }
}
