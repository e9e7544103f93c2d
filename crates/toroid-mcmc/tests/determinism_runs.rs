use rayon::ThreadPoolBuilder;

use toroid_mcmc::scan::{immunity_scan, temperature_scan};
use toroid_mcmc::{
    run_ising, run_life_equilibration, run_sirs, ImmunityScan, IsingConfig, LifeConfig,
    SamplingConfig, SirsConfig, SpinDynamicsKind, TemperatureScan, ValueRange,
};

fn small_ising(dynamics: SpinDynamicsKind) -> IsingConfig {
    IsingConfig {
        size: 8,
        temperature: 2.2,
        dynamics,
        sampling: SamplingConfig::new(60, 10, 5),
        bootstrap_resamples: 20,
        ..IsingConfig::default()
    }
}

fn small_sirs() -> SirsConfig {
    SirsConfig {
        size: 10,
        sampling: SamplingConfig::new(60, 10, 2),
        bootstrap_resamples: 20,
        ..SirsConfig::default()
    }
}

#[test]
fn repeated_runs_with_same_seed_match() {
    for dynamics in [SpinDynamicsKind::Glauber, SpinDynamicsKind::Kawasaki] {
        let config = small_ising(dynamics);
        let a = run_ising(&config, 2024).unwrap();
        let b = run_ising(&config, 2024).unwrap();
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.lattice, b.lattice);
    }

    let a = run_sirs(&small_sirs(), 2024).unwrap().summary;
    let b = run_sirs(&small_sirs(), 2024).unwrap().summary;
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    let life = LifeConfig {
        size: 12,
        ..LifeConfig::default()
    };
    let a = run_life_equilibration(&life, 2024).unwrap().summary;
    let b = run_life_equilibration(&life, 2024).unwrap().summary;
    assert_eq!(a, b);
}

#[test]
fn different_seeds_give_different_trajectories() {
    let config = small_ising(SpinDynamicsKind::Kawasaki);
    let a = run_ising(&config, 1).unwrap().summary;
    let b = run_ising(&config, 2).unwrap().summary;
    assert_ne!(a.final_lattice_hash, b.final_lattice_hash);
}

#[test]
fn scans_do_not_depend_on_thread_count() {
    let temperatures = TemperatureScan {
        base: small_ising(SpinDynamicsKind::Glauber),
        temperatures: ValueRange::Linspace {
            start: 1.5,
            stop: 3.0,
            count: 4,
        },
        anneal: false,
    };
    let immunity = ImmunityScan {
        base: small_sirs(),
        fractions: ValueRange::List {
            values: vec![0.0, 0.25, 0.5],
        },
    };

    let single = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let (serial_t, serial_i) =
        single.install(|| (temperature_scan(&temperatures), immunity_scan(&immunity)));
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let (parallel_t, parallel_i) =
        pool.install(|| (temperature_scan(&temperatures), immunity_scan(&immunity)));

    assert_eq!(serial_t.unwrap(), parallel_t.unwrap());
    assert_eq!(serial_i.unwrap(), parallel_i.unwrap());
}

#[test]
fn annealed_scan_is_reproducible() {
    let scan = TemperatureScan {
        base: small_ising(SpinDynamicsKind::Glauber),
        temperatures: ValueRange::List {
            values: vec![1.0, 2.0, 3.0],
        },
        anneal: true,
    };
    let a = temperature_scan(&scan).unwrap();
    let b = temperature_scan(&scan).unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(a, b);
}
