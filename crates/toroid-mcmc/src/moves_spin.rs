use serde::{Deserialize, Serialize};
use toroid_core::errors::ErrorInfo;
use toroid_core::{Lattice, RandomSource, Spin, ToroidError};

use crate::rule::{boltzmann_accept, check_temperature, AttemptOutcome, SweepKind, UpdateRule};

/// Default number of pair draws Kawasaki makes before giving up.
pub const DEFAULT_MAX_PAIR_DRAWS: usize = 10_000;

/// Energy change from flipping the spin at `site`: `2 * s * sum(neighbours)`.
#[inline]
pub fn flip_energy(lattice: &Lattice<Spin>, site: usize) -> i64 {
    let (row, col) = lattice.coords(site);
    let field: i32 = lattice
        .von_neumann(row as isize, col as isize)
        .iter()
        .map(|spin| spin.value())
        .sum();
    2 * i64::from(lattice.get_site(site).value()) * i64::from(field)
}

/// Single-site flip dynamics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glauber {
    temperature: f64,
}

impl Glauber {
    /// Binds the rule to a temperature.
    pub fn new(temperature: f64) -> Result<Self, ToroidError> {
        check_temperature(temperature)?;
        Ok(Self { temperature })
    }

    /// Bound temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl UpdateRule for Glauber {
    type State = Spin;
    const KIND: SweepKind = SweepKind::SingleSite;

    fn attempt<R>(
        &self,
        lattice: &mut Lattice<Spin>,
        rng: &mut R,
    ) -> Result<AttemptOutcome, ToroidError>
    where
        R: RandomSource + ?Sized,
    {
        let site = rng.index(lattice.len());
        let delta = flip_energy(lattice, site) as f64;
        if boltzmann_accept(delta, self.temperature, rng) {
            let flipped = lattice.get_site(site).flipped();
            lattice.set_site(site, flipped);
            Ok(AttemptOutcome::Accepted)
        } else {
            Ok(AttemptOutcome::Rejected)
        }
    }
}

/// Spin-exchange dynamics conserving magnetisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kawasaki {
    temperature: f64,
    max_pair_draws: usize,
}

impl Kawasaki {
    /// Binds the rule to a temperature with the default pair-draw budget.
    pub fn new(temperature: f64) -> Result<Self, ToroidError> {
        Self::with_max_pair_draws(temperature, DEFAULT_MAX_PAIR_DRAWS)
    }

    /// Binds the rule with an explicit budget for finding an unlike pair.
    pub fn with_max_pair_draws(
        temperature: f64,
        max_pair_draws: usize,
    ) -> Result<Self, ToroidError> {
        check_temperature(temperature)?;
        Ok(Self {
            temperature,
            max_pair_draws: max_pair_draws.max(1),
        })
    }

    /// Bound temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Draws an ordered pair of opposite spins.
    ///
    /// Sites are redrawn until they differ, at most `max_pair_draws` times.
    /// After that the pair is drawn directly from the up and down sites,
    /// which yields the same distribution. Only a lattice without both spin
    /// values fails.
    fn draw_unlike_pair<R>(
        &self,
        lattice: &Lattice<Spin>,
        rng: &mut R,
    ) -> Result<(usize, usize), ToroidError>
    where
        R: RandomSource + ?Sized,
    {
        let len = lattice.len();
        for _ in 0..self.max_pair_draws {
            let first = rng.index(len);
            let second = rng.index(len);
            if lattice.get_site(first) != lattice.get_site(second) {
                return Ok((first, second));
            }
        }
        let up = lattice.count(Spin::Up);
        if up == 0 || up == len {
            tracing::warn!(
                draws = self.max_pair_draws,
                up,
                size = lattice.size(),
                "kawasaki found no opposite spins"
            );
            return Err(self.homogeneous(up, len));
        }
        let nth = |spin: Spin, k: usize| {
            lattice
                .cells()
                .iter()
                .enumerate()
                .filter(|&(_, &cell)| cell == spin)
                .nth(k)
                .map(|(site, _)| site)
        };
        let (up_site, down_site) = nth(Spin::Up, rng.index(up))
            .zip(nth(Spin::Down, rng.index(len - up)))
            .ok_or_else(|| self.homogeneous(up, len))?;
        tracing::debug!(up, cells = len, "kawasaki pair drawn by spin class");
        if rng.index(2) == 0 {
            Ok((up_site, down_site))
        } else {
            Ok((down_site, up_site))
        }
    }

    fn homogeneous(&self, up: usize, cells: usize) -> ToroidError {
        ToroidError::Dynamics(
            ErrorInfo::new("homogeneous-lattice", "lattice holds a single spin value")
                .with_context("draws", self.max_pair_draws.to_string())
                .with_context("up", up.to_string())
                .with_context("cells", cells.to_string())
                .with_hint("start Kawasaki runs from a mixed configuration such as a split lattice"),
        )
    }
}

impl UpdateRule for Kawasaki {
    type State = Spin;
    const KIND: SweepKind = SweepKind::SingleSite;

    fn attempt<R>(
        &self,
        lattice: &mut Lattice<Spin>,
        rng: &mut R,
    ) -> Result<AttemptOutcome, ToroidError>
    where
        R: RandomSource + ?Sized,
    {
        let (first, second) = self.draw_unlike_pair(lattice, rng)?;
        // the shared bond enters both flip energies
        let correction = if lattice.are_adjacent(first, second) {
            2 * i64::from(lattice.get_site(first).value())
                * i64::from(lattice.get_site(second).value())
        } else {
            0
        };
        let delta = flip_energy(lattice, first) + flip_energy(lattice, second) - correction;
        if boltzmann_accept(delta as f64, self.temperature, rng) {
            lattice.swap_sites(first, second);
            Ok(AttemptOutcome::Accepted)
        } else {
            Ok(AttemptOutcome::Rejected)
        }
    }
}

/// Selector for the spin dynamics in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpinDynamicsKind {
    /// Single-site flips.
    Glauber,
    /// Spin exchange.
    Kawasaki,
}

impl SpinDynamicsKind {
    /// Lower-case name used in tables and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinDynamicsKind::Glauber => "glauber",
            SpinDynamicsKind::Kawasaki => "kawasaki",
        }
    }
}

/// Closed set of spin dynamics chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinDynamics {
    /// Single-site flips.
    Glauber(Glauber),
    /// Spin exchange.
    Kawasaki(Kawasaki),
}

impl SpinDynamics {
    /// Builds the dynamics named by `kind`.
    pub fn new(
        kind: SpinDynamicsKind,
        temperature: f64,
        max_pair_draws: usize,
    ) -> Result<Self, ToroidError> {
        Ok(match kind {
            SpinDynamicsKind::Glauber => SpinDynamics::Glauber(Glauber::new(temperature)?),
            SpinDynamicsKind::Kawasaki => SpinDynamics::Kawasaki(Kawasaki::with_max_pair_draws(
                temperature,
                max_pair_draws,
            )?),
        })
    }

    /// Bound temperature.
    pub fn temperature(&self) -> f64 {
        match self {
            SpinDynamics::Glauber(rule) => rule.temperature(),
            SpinDynamics::Kawasaki(rule) => rule.temperature(),
        }
    }

    /// Selector the dynamics was built from.
    pub fn kind(&self) -> SpinDynamicsKind {
        match self {
            SpinDynamics::Glauber(_) => SpinDynamicsKind::Glauber,
            SpinDynamics::Kawasaki(_) => SpinDynamicsKind::Kawasaki,
        }
    }
}

impl UpdateRule for SpinDynamics {
    type State = Spin;
    const KIND: SweepKind = SweepKind::SingleSite;

    fn attempt<R>(
        &self,
        lattice: &mut Lattice<Spin>,
        rng: &mut R,
    ) -> Result<AttemptOutcome, ToroidError>
    where
        R: RandomSource + ?Sized,
    {
        match self {
            SpinDynamics::Glauber(rule) => rule.attempt(lattice, rng),
            SpinDynamics::Kawasaki(rule) => rule.attempt(lattice, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toroid_core::RngHandle;

    #[test]
    fn flip_energy_of_aligned_spin_is_eight() {
        let lattice = Lattice::uniform(4, Spin::Up).unwrap();
        assert_eq!(flip_energy(&lattice, 0), 8);
        let mut lattice = lattice;
        lattice.set(1, 1, Spin::Down);
        assert_eq!(flip_energy(&lattice, lattice.site(1, 1)), -8);
        assert_eq!(flip_energy(&lattice, lattice.site(0, 1)), 4);
    }

    #[test]
    fn glauber_rejects_uphill_flip_at_low_temperature() {
        let mut lattice = Lattice::uniform(1, Spin::Down).unwrap();
        // every neighbour of the single site is the site itself: delta = 8
        let rule = Glauber::new(1e-3).unwrap();
        let mut rng = RngHandle::from_seed(4);
        let outcome = rule.attempt(&mut lattice, &mut rng).unwrap();
        assert_eq!(outcome, AttemptOutcome::Rejected);
        assert_eq!(lattice.get(0, 0), Spin::Down);
    }

    #[test]
    fn invalid_temperature_is_rejected() {
        assert_eq!(Glauber::new(0.0).unwrap_err().code(), "invalid-temperature");
        assert_eq!(
            Kawasaki::new(f64::NAN).unwrap_err().code(),
            "invalid-temperature"
        );
    }

    #[test]
    fn kawasaki_reports_homogeneous_lattice() {
        let mut lattice = Lattice::uniform(5, Spin::Up).unwrap();
        let rule = Kawasaki::with_max_pair_draws(2.0, 64).unwrap();
        let mut rng = RngHandle::from_seed(9);
        let err = rule.attempt(&mut lattice, &mut rng).unwrap_err();
        assert_eq!(err.code(), "homogeneous-lattice");
        assert_eq!(err.info().context.get("draws").map(String::as_str), Some("64"));
    }

    /// Always draws site 0 and a zero uniform.
    struct Zeros;

    impl RandomSource for Zeros {
        fn uniform(&mut self) -> f64 {
            0.0
        }

        fn index(&mut self, _upper: usize) -> usize {
            0
        }
    }

    #[test]
    fn exhausted_draw_budget_still_finds_the_lone_minority_spin() {
        let mut lattice = Lattice::uniform(4, Spin::Up).unwrap();
        lattice.set_site(5, Spin::Down);
        let rule = Kawasaki::with_max_pair_draws(2.0, 1).unwrap();
        let outcome = rule.attempt(&mut lattice, &mut Zeros).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(lattice.get_site(0), Spin::Down);
        assert_eq!(lattice.get_site(5), Spin::Up);
        assert_eq!(lattice.count(Spin::Down), 1);
    }

    #[test]
    fn dynamics_selector_round_trips() {
        let dynamics = SpinDynamics::new(SpinDynamicsKind::Kawasaki, 1.5, 10).unwrap();
        assert_eq!(dynamics.kind(), SpinDynamicsKind::Kawasaki);
        assert_eq!(dynamics.temperature(), 1.5);
    }
}
