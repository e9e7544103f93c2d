use proptest::collection::vec;
use proptest::prelude::*;
use toroid_core::{Epidemic, InitialCondition, Lattice, RandomSource, RngHandle};

use toroid_mcmc::observables::infected_count;
use toroid_mcmc::{run_sirs, SamplingConfig, SimulationRun, Sirs, SirsConfig, UpdateRule};

/// Replays a fixed site and a cycle of uniform draws.
struct Scripted {
    site: usize,
    draws: Vec<f64>,
    next: usize,
}

impl RandomSource for Scripted {
    fn uniform(&mut self) -> f64 {
        let draw = self.draws[self.next % self.draws.len()];
        self.next += 1;
        draw
    }

    fn index(&mut self, upper: usize) -> usize {
        self.site % upper
    }
}

fn non_infected(code: u8) -> Epidemic {
    match code % 3 {
        0 => Epidemic::Susceptible,
        1 => Epidemic::Recovered,
        _ => Epidemic::Immune,
    }
}

proptest! {
    #[test]
    fn susceptible_without_infected_neighbour_never_falls_ill(
        p1 in 0.0f64..=1.0,
        draws in vec(0.0f64..1.0, 1..16),
        codes in vec(any::<u8>(), 25),
    ) {
        let cells = codes.iter().map(|&code| non_infected(code)).collect();
        let mut lattice = Lattice::from_cells(5, cells).unwrap();
        lattice.set(2, 2, Epidemic::Susceptible);
        // diagonal neighbours do not count
        lattice.set(1, 1, Epidemic::Infected);
        lattice.set(3, 3, Epidemic::Infected);
        let rule = Sirs::new(p1, 0.0, 0.0).unwrap();
        let mut rng = Scripted { site: lattice.site(2, 2), draws, next: 0 };
        for _ in 0..50 {
            rule.attempt(&mut lattice, &mut rng).unwrap();
            prop_assert_eq!(lattice.get(2, 2), Epidemic::Susceptible);
        }
    }

    #[test]
    fn infection_free_lattice_stays_free(
        p1 in 0.0f64..=1.0,
        p3 in 0.0f64..=1.0,
        seed in any::<u64>(),
        codes in vec(any::<u8>(), 36),
    ) {
        let cells = codes.iter().map(|&code| non_infected(code)).collect();
        let mut lattice = Lattice::from_cells(6, cells).unwrap();
        let immune = lattice.count(Epidemic::Immune);
        let rule = Sirs::new(p1, 1.0, p3).unwrap();
        let mut rng = RngHandle::from_seed(seed);
        for _ in 0..5 {
            toroid_mcmc::sweep(&rule, &mut lattice, &mut rng).unwrap();
        }
        prop_assert_eq!(infected_count(&lattice), 0);
        prop_assert_eq!(lattice.count(Epidemic::Immune), immune);
    }
}

fn bit(state: Epidemic) -> u8 {
    match state {
        Epidemic::Susceptible => 1,
        Epidemic::Infected => 2,
        Epidemic::Recovered => 4,
        Epidemic::Immune => 8,
    }
}

#[test]
fn certain_transitions_cycle_every_site_through_all_states() {
    let mut rng = RngHandle::from_seed(2024);
    let init = InitialCondition::equal_weights(&[
        Epidemic::Susceptible,
        Epidemic::Infected,
        Epidemic::Recovered,
    ]);
    let mut lattice = Lattice::new(16, &init, &mut rng).unwrap();
    lattice.set(0, 0, Epidemic::Infected);
    let mut visited: Vec<u8> = lattice.cells().iter().map(|&cell| bit(cell)).collect();

    let mut run = SimulationRun::new(lattice, Sirs::new(1.0, 1.0, 1.0).unwrap(), rng);
    let mut sweeps = 0;
    while visited.iter().any(|&mask| mask != 7) {
        assert!(sweeps < 500, "not every site cycled within 500 sweeps");
        run.sweep().unwrap();
        sweeps += 1;
        for (mask, &cell) in visited.iter_mut().zip(run.lattice().cells()) {
            *mask |= bit(cell);
        }
    }
}

#[test]
fn immune_cells_suppress_the_epidemic() {
    let base = SirsConfig {
        size: 20,
        sampling: SamplingConfig::new(300, 100, 1),
        bootstrap_resamples: 20,
        ..SirsConfig::default()
    };
    let open = run_sirs(&base, 4).unwrap().summary;
    let shielded = run_sirs(
        &SirsConfig {
            immunity_fraction: 1.0,
            ..base
        },
        4,
    )
    .unwrap()
    .summary;
    assert!(open.infected_fraction > 0.0);
    assert_eq!(shielded.infected_fraction, 0.0);
    assert_eq!(shielded.acceptance_rate, 0.0);
}
