//! Throughput of the per-sample advance loop.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ampsim::prelude::*;

fn clipper() -> Circuit {
    let components: Vec<Box<dyn Component>> = vec![
        Box::new(VoltageSource::new("VIN", "IN", "0", Waveform::input("in"))),
        Box::new(Resistor::new("RIN", "IN", "X", 10e3)),
        Box::new(OpAmp::new("U1", "OUT", "0", "0", "X")),
        Box::new(Resistor::new("RF", "X", "OUT", 51e3)),
        Box::new(Diode::new("D1", "X", "OUT", 4.352e-9, 1.906)),
        Box::new(Diode::new("D2", "OUT", "X", 4.352e-9, 1.906)),
    ];
    Circuit::build(components).expect("clipper builds")
}

fn bench_advance(c: &mut Criterion) {
    c.bench_function("clipper_advance_48k", |bencher| {
        let mut circuit = clipper();
        let input = circuit.input("in").expect("registered input");
        let mut phase = 0.0f64;

        bencher.iter(|| {
            phase += 1e3 / 48e3;
            input.set(0.1 * (std::f64::consts::TAU * phase).sin());
            black_box(circuit.advance(1.0 / 48e3).expect("valid step"))
        });
    });
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("clipper_build", |bencher| {
        bencher.iter(|| black_box(clipper().size()))
    });
}

criterion_group!(benches, bench_advance, bench_build);
criterion_main!(benches);
