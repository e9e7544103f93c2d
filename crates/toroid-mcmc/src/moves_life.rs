use toroid_core::{Lattice, Life, RandomSource, ToroidError};

use crate::rule::{AttemptOutcome, SweepKind, UpdateRule};

/// Conway's B3/S23 rule applied to the whole grid at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifeRule;

impl LifeRule {
    /// Next state of a cell given its current state and live Moore neighbours.
    #[inline]
    pub fn next_state(current: Life, live_neighbors: usize) -> Life {
        match (current, live_neighbors) {
            (Life::Alive, 2) | (_, 3) => Life::Alive,
            _ => Life::Dead,
        }
    }

    /// Performs one synchronous pass.
    pub fn step(lattice: &mut Lattice<Life>) {
        lattice.update_synchronous(|grid, row, col| {
            let live = grid
                .moore(row, col)
                .iter()
                .filter(|cell| cell.is_alive())
                .count();
            Self::next_state(grid.get(row, col), live)
        });
    }
}

impl UpdateRule for LifeRule {
    type State = Life;
    const KIND: SweepKind = SweepKind::Synchronous;

    fn attempt<R>(
        &self,
        lattice: &mut Lattice<Life>,
        _rng: &mut R,
    ) -> Result<AttemptOutcome, ToroidError>
    where
        R: RandomSource + ?Sized,
    {
        Self::step(lattice);
        Ok(AttemptOutcome::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use toroid_core::{InitialCondition, Pattern, RngHandle};

    #[test]
    fn birth_and_survival_table() {
        assert_eq!(LifeRule::next_state(Life::Dead, 3), Life::Alive);
        assert_eq!(LifeRule::next_state(Life::Dead, 2), Life::Dead);
        assert_eq!(LifeRule::next_state(Life::Alive, 2), Life::Alive);
        assert_eq!(LifeRule::next_state(Life::Alive, 3), Life::Alive);
        assert_eq!(LifeRule::next_state(Life::Alive, 1), Life::Dead);
        assert_eq!(LifeRule::next_state(Life::Alive, 4), Life::Dead);
    }

    #[test]
    fn blinker_turns_vertical_after_one_pass() {
        let mut rng = RngHandle::from_seed(0);
        let init = InitialCondition::pattern(Pattern::Oscillator, Life::Alive, Life::Dead);
        let mut lattice = Lattice::new(7, &init, &mut rng).unwrap();
        LifeRule::step(&mut lattice);
        let live = lattice.coordinates_of(Life::Alive);
        let expected: BTreeSet<(usize, usize)> = [(2, 3), (3, 3), (4, 3)].into_iter().collect();
        assert_eq!(live, expected);
    }

    #[test]
    fn block_is_still_life() {
        let mut lattice = Lattice::uniform(6, Life::Dead).unwrap();
        for (row, col) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            lattice.set(row, col, Life::Alive);
        }
        let before = lattice.clone();
        LifeRule::step(&mut lattice);
        assert_eq!(lattice, before);
    }
}
