use serde::{Deserialize, Serialize};
use toroid_core::errors::ErrorInfo;
use toroid_core::{CellState, Lattice, RandomSource, ToroidError};

/// How the sweep scheduler drives a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepKind {
    /// `N^2` independent single-site attempts per sweep, sites drawn with replacement.
    SingleSite,
    /// One deterministic whole-grid pass per sweep.
    Synchronous,
}

/// Result of a single call to [`UpdateRule::attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The lattice was modified.
    Accepted,
    /// The proposal was rejected or no transition fired.
    Rejected,
}

impl AttemptOutcome {
    /// Returns `true` for [`AttemptOutcome::Accepted`].
    pub fn is_accepted(self) -> bool {
        matches!(self, AttemptOutcome::Accepted)
    }
}

/// One dynamics acting on a lattice of a fixed state domain.
///
/// Rules are bound to their parameters at construction and never capture the
/// lattice or the random source; both are handed in on every attempt.
pub trait UpdateRule {
    /// Cell domain the rule operates on.
    type State: CellState;

    /// Scheduling mode used by [`crate::sweep::sweep`].
    const KIND: SweepKind;

    /// Performs one proposal (single-site rules) or one full pass (synchronous rules).
    fn attempt<R>(
        &self,
        lattice: &mut Lattice<Self::State>,
        rng: &mut R,
    ) -> Result<AttemptOutcome, ToroidError>
    where
        R: RandomSource + ?Sized;
}

/// Boltzmann acceptance shared by the spin dynamics: accept downhill moves
/// outright, uphill moves with probability `exp(-delta / temperature)`.
pub fn boltzmann_accept<R>(delta: f64, temperature: f64, rng: &mut R) -> bool
where
    R: RandomSource + ?Sized,
{
    delta <= 0.0 || rng.uniform() < (-delta / temperature).exp()
}

/// Rejects temperatures that would make the acceptance test meaningless.
pub fn check_temperature(temperature: f64) -> Result<(), ToroidError> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(ToroidError::Config(
            ErrorInfo::new("invalid-temperature", "temperature must be finite and positive")
                .with_context("temperature", temperature.to_string()),
        ));
    }
    Ok(())
}

/// Rejects transition probabilities outside `[0, 1]`.
pub fn check_probability(name: &str, value: f64) -> Result<(), ToroidError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ToroidError::Config(
            ErrorInfo::new("invalid-probability", "probabilities must lie in [0, 1]")
                .with_context("parameter", name)
                .with_context("value", value.to_string()),
        ));
    }
    Ok(())
}
