use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use toroid_core::{Lattice, RandomSource, ToroidError};

use crate::rule::{SweepKind, UpdateRule};

/// Attempt and acceptance counts of one or more sweeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepStats {
    /// Calls made to [`UpdateRule::attempt`].
    pub attempts: u64,
    /// Calls that modified the lattice.
    pub accepted: u64,
}

impl SweepStats {
    /// Fraction of attempts that were accepted, `0` when nothing was attempted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }
}

impl AddAssign for SweepStats {
    fn add_assign(&mut self, rhs: Self) {
        self.attempts += rhs.attempts;
        self.accepted += rhs.accepted;
    }
}

/// Number of [`UpdateRule::attempt`] calls that make up one sweep of `kind`.
pub fn attempts_per_sweep(kind: SweepKind, cells: usize) -> usize {
    match kind {
        SweepKind::SingleSite => cells,
        SweepKind::Synchronous => 1,
    }
}

/// Applies one sweep of `rule` to `lattice`.
///
/// Single-site rules get `N^2` independent attempts, each choosing its own
/// site, so a site may be visited several times or not at all. Synchronous
/// rules get exactly one whole-grid pass.
pub fn sweep<U, R>(
    rule: &U,
    lattice: &mut Lattice<U::State>,
    rng: &mut R,
) -> Result<SweepStats, ToroidError>
where
    U: UpdateRule,
    R: RandomSource + ?Sized,
{
    let attempts = attempts_per_sweep(U::KIND, lattice.len());
    let mut stats = SweepStats::default();
    for _ in 0..attempts {
        let outcome = rule.attempt(lattice, rng)?;
        stats.attempts += 1;
        if outcome.is_accepted() {
            stats.accepted += 1;
        }
    }
    Ok(stats)
}
