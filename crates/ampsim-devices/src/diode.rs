//! Two-terminal nonlinear resistors and the Shockley diode.
//!
//! A nonlinear resistor is described by its i-v characteristic
//! `f(v) -> (i, di/dv)`. Each Newton iteration linearizes the device at
//! the present iterate into a conductance `G = di/dv` in parallel with
//! a current source `I0 = f(v) - G·v`, the standard companion model.

use ampsim_core::{
    Classification, Component, EntryTable, MatrixEntry, Result, RhsEntry, SignalBank,
    SolutionRef, SparseSystem,
};

/// Boltzmann constant (J/K).
const K_BOLTZMANN: f64 = 1.3806504e-23;
/// Elementary charge (C).
const Q_ELECTRON: f64 = 1.602176487e-19;

/// Thermal voltage `kT/q` at a given temperature.
pub fn thermal_voltage(temp_k: f64) -> f64 {
    K_BOLTZMANN * temp_k / Q_ELECTRON
}

/// An i-v characteristic: current and its derivative at a voltage.
pub trait IvCurve: Send + std::fmt::Debug {
    fn eval(&self, v: f64) -> (f64, f64);
}

/// The Shockley equation with a linear continuation above a knee.
///
/// Below the knee the current is `Is·expm1(v/(N·Vt))`; above it the
/// curve continues with its first-order Taylor expansion, which keeps
/// Newton iterates finite when a diode is driven deep into forward
/// bias mid-iteration.
#[derive(Debug, Clone)]
pub struct Shockley {
    saturation: f64,
    n_vt: f64,
    i_knee: f64,
    g_knee: f64,
}

/// Knee voltage for the linear continuation (V).
pub const V_KNEE: f64 = 0.8;

impl Shockley {
    /// `is` is the saturation current, `n` the emission coefficient.
    /// The thermal voltage is taken at 300 K.
    pub fn new(is: f64, n: f64) -> Self {
        let n_vt = n * thermal_voltage(300.0);
        Self {
            saturation: is,
            n_vt,
            i_knee: is * (V_KNEE / n_vt).exp_m1(),
            g_knee: is * (V_KNEE / n_vt).exp() / n_vt,
        }
    }
}

impl IvCurve for Shockley {
    fn eval(&self, v: f64) -> (f64, f64) {
        if v < V_KNEE {
            let vn = v / self.n_vt;
            let i = self.saturation * vn.exp_m1();
            let g = self.saturation * vn.exp() / self.n_vt;
            (i, g)
        } else {
            (self.i_knee + self.g_knee * (v - V_KNEE), self.g_knee)
        }
    }
}

/// A two-terminal nonlinear resistor parameterized by its i-v curve.
#[derive(Debug, Clone)]
pub struct NonlinearResistor<C: IvCurve> {
    name: String,
    node_a: String,
    node_b: String,
    curve: C,

    aa: MatrixEntry,
    ab: MatrixEntry,
    ba: MatrixEntry,
    bb: MatrixEntry,
    rhs_a: RhsEntry,
    rhs_b: RhsEntry,
    xa: SolutionRef,
    xb: SolutionRef,
}

impl<C: IvCurve> NonlinearResistor<C> {
    pub fn with_curve(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        curve: C,
    ) -> Self {
        Self {
            name: name.into(),
            node_a: a.into(),
            node_b: b.into(),
            curve,
            aa: MatrixEntry::default(),
            ab: MatrixEntry::default(),
            ba: MatrixEntry::default(),
            bb: MatrixEntry::default(),
            rhs_a: RhsEntry::default(),
            rhs_b: RhsEntry::default(),
            xa: SolutionRef::default(),
            xb: SolutionRef::default(),
        }
    }
}

/// A junction diode: anode `a`, cathode `b`.
pub type Diode = NonlinearResistor<Shockley>;

impl NonlinearResistor<Shockley> {
    /// Create a diode with saturation current `is` and emission
    /// coefficient `n`.
    pub fn new(
        name: impl Into<String>,
        anode: impl Into<String>,
        cathode: impl Into<String>,
        is: f64,
        n: f64,
    ) -> Self {
        NonlinearResistor::with_curve(name, anode, cathode, Shockley::new(is, n))
    }
}

impl<C: IvCurve> Component for NonlinearResistor<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn classification(&self) -> Classification {
        Classification::NONLINEAR
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
        self.rhs_a = system.rhs_entry(&self.node_a)?;
        self.rhs_b = system.rhs_entry(&self.node_b)?;
        self.xa = system.solution_ref(&self.node_a)?;
        self.xb = system.solution_ref(&self.node_b)?;
        Ok(())
    }

    fn fill(&self, system: &mut SparseSystem) {
        let v = system.solution(self.xa) - system.solution(self.xb);
        let (i, g) = self.curve.eval(v);
        let i0 = i - g * v;

        system.add_a(self.aa, g);
        system.add_a(self.ab, -g);
        system.add_a(self.ba, -g);
        system.add_a(self.bb, g);

        system.add_b(self.rhs_a, -i0);
        system.add_b(self.rhs_b, i0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampsim_core::Layer;

    #[test]
    fn test_thermal_voltage() {
        let vt = thermal_voltage(300.0);
        assert!((vt - 0.025852).abs() < 1e-5, "Vt = {vt}");
    }

    #[test]
    fn test_shockley_forward() {
        let curve = Shockley::new(1e-14, 1.0);
        let (i, g) = curve.eval(0.6);
        assert!(i > 1e-5, "forward current should be significant: {i}");
        assert!(g > 0.0);
    }

    #[test]
    fn test_shockley_reverse_saturates() {
        let curve = Shockley::new(1e-14, 1.0);
        let (i, _) = curve.eval(-5.0);
        assert!((i + 1e-14).abs() < 1e-16, "reverse current ~ -Is: {i}");
    }

    #[test]
    fn test_shockley_zero_bias() {
        let curve = Shockley::new(1e-14, 1.0);
        let (i, g) = curve.eval(0.0);
        assert_eq!(i, 0.0);
        assert!((g - 1e-14 / thermal_voltage(300.0)).abs() < 1e-15);
    }

    #[test]
    fn test_knee_continuation_is_continuous_and_finite() {
        let curve = Shockley::new(4.352e-9, 1.906);
        let (below, g_below) = curve.eval(V_KNEE - 1e-9);
        let (above, g_above) = curve.eval(V_KNEE + 1e-9);
        assert!((below - above).abs() < above * 1e-6);
        assert!((g_below - g_above).abs() < g_above * 1e-3);

        // far beyond the knee the extrapolation must stay finite
        let (i, g) = curve.eval(50.0);
        assert!(i.is_finite() && g.is_finite());
    }

    #[test]
    fn test_companion_stamp() {
        let mut d = Diode::new("D1", "1", "0", 1e-14, 1.0);
        let mut table = EntryTable::new();
        let mut signals = SignalBank::new();
        d.register(&mut table, &mut signals);
        table.freeze().unwrap();
        let mut system = SparseSystem::new(table);
        d.bind(&system).unwrap();

        system.set_active(Layer::Nonlinear);
        d.fill(&mut system);

        // at the zero iterate the companion current source vanishes
        let g0 = 1e-14 / thermal_voltage(300.0);
        assert!((system.layer_a(Layer::Nonlinear)[0] - g0).abs() < 1e-16);
        assert_eq!(system.layer_b(Layer::Nonlinear)[0], 0.0);
    }
}
