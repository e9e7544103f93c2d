use proptest::collection::vec;
use proptest::prelude::*;
use toroid_core::{Lattice, RngHandle, Spin};

use toroid_mcmc::moves_spin::flip_energy;
use toroid_mcmc::observables::{magnetization, total_energy};
use toroid_mcmc::{run_ising, sweep, IsingConfig, Kawasaki, SamplingConfig, UpdateRule};

fn spins(size: usize, ups: &[bool]) -> Lattice<Spin> {
    let cells = ups
        .iter()
        .map(|&up| if up { Spin::Up } else { Spin::Down })
        .collect();
    Lattice::from_cells(size, cells).unwrap()
}

fn mixed_lattice() -> impl Strategy<Value = (usize, Vec<bool>)> {
    (2usize..9).prop_flat_map(|size| (Just(size), vec(any::<bool>(), size * size)))
}

proptest! {
    #[test]
    fn kawasaki_attempt_preserves_spin_counts(
        (size, ups) in mixed_lattice(),
        temperature in 0.05f64..5.0,
        seed in any::<u64>(),
    ) {
        prop_assume!(ups.iter().any(|&up| up) && ups.iter().any(|&up| !up));
        let mut lattice = spins(size, &ups);
        let before = lattice.count(Spin::Up);
        let rule = Kawasaki::new(temperature).unwrap();
        let mut rng = RngHandle::from_seed(seed);
        for _ in 0..32 {
            rule.attempt(&mut lattice, &mut rng).unwrap();
            prop_assert_eq!(lattice.count(Spin::Up), before);
            prop_assert_eq!(lattice.count(Spin::Down), size * size - before);
        }
    }

    #[test]
    fn energy_change_of_flip_matches_total_energy(
        (size, ups) in mixed_lattice(),
        site in any::<usize>(),
    ) {
        let mut lattice = spins(size, &ups);
        let site = site % lattice.len();
        let before = total_energy(&lattice);
        let predicted = flip_energy(&lattice, site);
        let flipped = lattice.get_site(site).flipped();
        lattice.set_site(site, flipped);
        prop_assert_eq!(total_energy(&lattice) - before, predicted);
    }
}

#[test]
fn kawasaki_sweeps_conserve_magnetisation() {
    let mut lattice = Lattice::uniform(12, Spin::Up).unwrap();
    for row in 0..12 {
        for col in 6..12 {
            lattice.set(row, col, Spin::Down);
        }
    }
    let rule = Kawasaki::new(2.5).unwrap();
    let mut rng = RngHandle::from_seed(77);
    for _ in 0..20 {
        sweep(&rule, &mut lattice, &mut rng).unwrap();
        assert_eq!(magnetization(&lattice), 0);
    }
}

#[test]
fn kawasaki_sweeps_a_lattice_with_a_single_minority_spin() {
    let lone_down = || {
        let mut lattice = Lattice::uniform(50, Spin::Up).unwrap();
        lattice.set(25, 25, Spin::Down);
        lattice
    };

    // a small budget forces the per-class draw on almost every attempt
    let tight = Kawasaki::with_max_pair_draws(2.0, 100).unwrap();
    for seed in 0..10 {
        let mut lattice = lone_down();
        let mut rng = RngHandle::from_seed(seed);
        for _ in 0..3 {
            let stats = sweep(&tight, &mut lattice, &mut rng).unwrap();
            assert_eq!(stats.attempts, 2500);
        }
        assert_eq!(lattice.count(Spin::Down), 1);
    }

    let mut lattice = lone_down();
    let mut rng = RngHandle::from_seed(3);
    sweep(&Kawasaki::new(2.0).unwrap(), &mut lattice, &mut rng).unwrap();
    assert_eq!(magnetization(&lattice), 2498);
}

#[test]
fn frozen_glauber_keeps_full_magnetisation() {
    let config = IsingConfig {
        size: 10,
        temperature: 0.01,
        sampling: SamplingConfig::new(200, 100, 10),
        bootstrap_resamples: 50,
        ..IsingConfig::default()
    };
    let summary = run_ising(&config, 3).unwrap().summary;
    assert_eq!(summary.abs_magnetization, 100.0);
    assert_eq!(summary.magnetization.abs(), 100.0);
    assert_eq!(summary.energy, -200.0);
    assert_eq!(summary.susceptibility, 0.0);
    assert_eq!(summary.susceptibility_error, 0.0);
    assert_eq!(summary.heat_capacity_error, 0.0);
    assert_eq!(summary.acceptance_rate, 0.0);
}

#[test]
fn hot_glauber_disorders_the_lattice() {
    let config = IsingConfig {
        size: 16,
        temperature: 50.0,
        sampling: SamplingConfig::new(400, 100, 10),
        bootstrap_resamples: 50,
        ..IsingConfig::default()
    };
    let summary = run_ising(&config, 9).unwrap().summary;
    assert!(summary.abs_magnetization < 0.5 * 256.0);
    assert!(summary.acceptance_rate > 0.8);
}
