use criterion::{black_box, criterion_group, criterion_main, Criterion};
use toroid_core::{Epidemic, InitialCondition, Lattice, Life, RngHandle, Spin};

use toroid_mcmc::{sweep, Glauber, Kawasaki, LifeRule, Sirs};

const SIZE: usize = 50;

fn bench_spin(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(42);
    let init = InitialCondition::equal_weights(&[Spin::Up, Spin::Down]);
    let start = Lattice::new(SIZE, &init, &mut rng).unwrap();

    let glauber = Glauber::new(2.27).unwrap();
    let mut lattice = start.clone();
    c.bench_function("glauber_sweep_50", |b| {
        b.iter(|| black_box(sweep(&glauber, &mut lattice, &mut rng).unwrap()))
    });

    let kawasaki = Kawasaki::new(2.27).unwrap();
    let mut lattice = start;
    c.bench_function("kawasaki_sweep_50", |b| {
        b.iter(|| black_box(sweep(&kawasaki, &mut lattice, &mut rng).unwrap()))
    });
}

fn bench_sirs(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(7);
    let init = InitialCondition::equal_weights(&[
        Epidemic::Susceptible,
        Epidemic::Infected,
        Epidemic::Recovered,
    ]);
    let mut lattice = Lattice::new(SIZE, &init, &mut rng).unwrap();
    let rule = Sirs::new(0.5, 0.5, 0.5).unwrap();
    c.bench_function("sirs_sweep_50", |b| {
        b.iter(|| black_box(sweep(&rule, &mut lattice, &mut rng).unwrap()))
    });
}

fn bench_life(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(3);
    let init = InitialCondition::equal_weights(&[Life::Dead, Life::Alive]);
    let mut lattice = Lattice::new(SIZE, &init, &mut rng).unwrap();
    c.bench_function("life_step_50", |b| {
        b.iter(|| black_box(sweep(&LifeRule, &mut lattice, &mut rng).unwrap()))
    });
}

criterion_group!(benches, bench_spin, bench_sirs, bench_life);
criterion_main!(benches);
