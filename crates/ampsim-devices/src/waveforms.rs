//! Time-varying source waveforms.
//!
//! A [`Waveform`] tells an independent source what value to produce at
//! a given simulated time. The `Input` variant instead reads a shared
//! [`Signal`] the host writes once per sample, which is how audio is
//! fed into a circuit.

use std::f64::consts::TAU;

use ampsim_core::{Signal, SignalBank};

/// A source value as a function of time (or of the host).
#[derive(Debug, Clone)]
pub enum Waveform {
    /// Constant value.
    Dc(f64),

    /// Damped sinusoid: `offset + amplitude·e^(−damping·t')·sin(2πf·t' + phase)`
    /// with `t' = t − delay`; before `delay` the waveform holds its
    /// t' = 0 value.
    Sin {
        offset: f64,
        amplitude: f64,
        frequency: f64,
        delay: f64,
        damping: f64,
        phase_deg: f64,
    },

    /// SPICE-style pulse train.
    Pulse {
        initial: f64,
        pulsed: f64,
        delay: f64,
        rise: f64,
        fall: f64,
        width: f64,
        period: f64,
    },

    /// Piecewise-linear interpolation over `(time, value)` points
    /// sorted by time; clamped outside the covered range.
    Pwl { points: Vec<(f64, f64)> },

    /// Per-sample feed written by the host under a registered name.
    Input { name: String, feed: Signal },
}

impl Waveform {
    pub fn dc(value: f64) -> Self {
        Waveform::Dc(value)
    }

    /// Undamped, undelayed sine.
    pub fn sin(offset: f64, amplitude: f64, frequency: f64) -> Self {
        Waveform::Sin {
            offset,
            amplitude,
            frequency,
            delay: 0.0,
            damping: 0.0,
            phase_deg: 0.0,
        }
    }

    pub fn sin_full(
        offset: f64,
        amplitude: f64,
        frequency: f64,
        delay: f64,
        damping: f64,
        phase_deg: f64,
    ) -> Self {
        Waveform::Sin {
            offset,
            amplitude,
            frequency,
            delay,
            damping,
            phase_deg,
        }
    }

    pub fn pulse(
        initial: f64,
        pulsed: f64,
        delay: f64,
        rise: f64,
        fall: f64,
        width: f64,
        period: f64,
    ) -> Self {
        Waveform::Pulse {
            initial,
            pulsed,
            delay,
            rise,
            fall,
            width,
            period,
        }
    }

    pub fn pwl(points: Vec<(f64, f64)>) -> Self {
        Waveform::Pwl { points }
    }

    /// A host-fed input, registered under `name` at build time.
    pub fn input(name: impl Into<String>) -> Self {
        Waveform::Input {
            name: name.into(),
            feed: Signal::new(0.0),
        }
    }

    /// True when the value never changes, so a source driven by this
    /// waveform can live in the static layer.
    pub fn is_time_invariant(&self) -> bool {
        matches!(self, Waveform::Dc(_))
    }

    /// Canonicalize shared signals against the bank. Called by the
    /// owning source during registration.
    pub fn attach(&mut self, signals: &mut SignalBank) {
        if let Waveform::Input { name, feed } = self {
            *feed = signals.register_input(name, 0.0);
        }
    }

    /// Evaluate at simulated time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        match self {
            Waveform::Dc(v) => *v,
            Waveform::Sin {
                offset,
                amplitude,
                frequency,
                delay,
                damping,
                phase_deg,
            } => eval_sin(*offset, *amplitude, *frequency, *delay, *damping, *phase_deg, t),
            Waveform::Pulse {
                initial,
                pulsed,
                delay,
                rise,
                fall,
                width,
                period,
            } => eval_pulse(*initial, *pulsed, *delay, *rise, *fall, *width, *period, t),
            Waveform::Pwl { points } => eval_pwl(points, t),
            Waveform::Input { feed, .. } => feed.get(),
        }
    }
}

fn eval_sin(
    offset: f64,
    amplitude: f64,
    frequency: f64,
    delay: f64,
    damping: f64,
    phase_deg: f64,
    t: f64,
) -> f64 {
    let phase = phase_deg.to_radians();
    let t = t - delay;
    if t < 0.0 {
        offset + amplitude * phase.sin()
    } else {
        offset + amplitude * (-damping * t).exp() * (TAU * frequency * t + phase).sin()
    }
}

#[allow(clippy::too_many_arguments)]
fn eval_pulse(
    initial: f64,
    pulsed: f64,
    delay: f64,
    rise: f64,
    fall: f64,
    width: f64,
    period: f64,
    t: f64,
) -> f64 {
    let mut t = t - delay;
    if t < 0.0 {
        return initial;
    }
    if period > 0.0 {
        t %= period;
    }
    if t < rise {
        initial + (pulsed - initial) * t / rise
    } else if t < rise + width {
        pulsed
    } else if t < rise + width + fall {
        pulsed + (initial - pulsed) * (t - rise - width) / fall
    } else {
        initial
    }
}

fn eval_pwl(points: &[(f64, f64)], t: f64) -> f64 {
    let Some(&(t0, v0)) = points.first() else {
        return 0.0;
    };
    if t <= t0 {
        return v0;
    }
    for pair in points.windows(2) {
        let (ta, va) = pair[0];
        let (tb, vb) = pair[1];
        if t <= tb {
            if tb <= ta {
                return vb;
            }
            return va + (vb - va) * (t - ta) / (tb - ta);
        }
    }
    points.last().map(|&(_, v)| v).unwrap_or(0.0)
}
