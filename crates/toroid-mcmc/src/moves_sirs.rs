use toroid_core::{Epidemic, Lattice, RandomSource, ToroidError};

use crate::rule::{check_probability, AttemptOutcome, SweepKind, UpdateRule};

/// Stochastic SIRS cellular automaton with an absorbing immune state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sirs {
    p1: f64,
    p2: f64,
    p3: f64,
}

impl Sirs {
    /// Binds the infection (`p1`), recovery (`p2`) and waning (`p3`) probabilities.
    pub fn new(p1: f64, p2: f64, p3: f64) -> Result<Self, ToroidError> {
        check_probability("p1", p1)?;
        check_probability("p2", p2)?;
        check_probability("p3", p3)?;
        Ok(Self { p1, p2, p3 })
    }
}

/// Whether any von Neumann neighbour of `(row, col)` is infected.
pub fn has_infected_neighbor(lattice: &Lattice<Epidemic>, row: isize, col: isize) -> bool {
    lattice
        .von_neumann(row, col)
        .iter()
        .any(|&cell| cell == Epidemic::Infected)
}

impl UpdateRule for Sirs {
    type State = Epidemic;
    const KIND: SweepKind = SweepKind::SingleSite;

    fn attempt<R>(
        &self,
        lattice: &mut Lattice<Epidemic>,
        rng: &mut R,
    ) -> Result<AttemptOutcome, ToroidError>
    where
        R: RandomSource + ?Sized,
    {
        let site = rng.index(lattice.len());
        let (row, col) = lattice.coords(site);
        let next = match lattice.get_site(site) {
            Epidemic::Susceptible => {
                let draw = rng.uniform();
                if draw < self.p1 && has_infected_neighbor(lattice, row as isize, col as isize) {
                    Some(Epidemic::Infected)
                } else {
                    None
                }
            }
            Epidemic::Infected => (rng.uniform() < self.p2).then_some(Epidemic::Recovered),
            Epidemic::Recovered => (rng.uniform() < self.p3).then_some(Epidemic::Susceptible),
            Epidemic::Immune => None,
        };
        match next {
            Some(state) => {
                lattice.set_site(site, state);
                Ok(AttemptOutcome::Accepted)
            }
            None => Ok(AttemptOutcome::Rejected),
        }
    }
}
