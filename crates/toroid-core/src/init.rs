//! Initial-condition descriptors used to populate a fresh lattice.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, ToroidError};
use crate::rng::RandomSource;
use crate::state::CellState;

/// A state paired with its relative weight for IID initialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<S> {
    /// State drawn with the given weight.
    pub state: S,
    /// Relative, non-negative weight. Weights are normalised before use.
    pub weight: f64,
}

/// Named patterns anchored at the centre cell `(N/2, N/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// Horizontal period-2 blinker.
    #[serde(alias = "blinker")]
    Oscillator,
    /// Glider travelling towards increasing row and column.
    Glider,
}

impl Pattern {
    /// Returns the unwrapped `(row, col)` offsets of the pattern's cells for a
    /// grid of the given size.
    pub fn cells(self, size: usize) -> Vec<(isize, isize)> {
        let c = (size / 2) as isize;
        match self {
            Pattern::Oscillator => vec![(c, c - 1), (c, c), (c, c + 1)],
            Pattern::Glider => vec![
                (c, c - 1),
                (c, c),
                (c, c + 1),
                (c - 1, c + 1),
                (c - 2, c),
            ],
        }
    }
}

/// Axis along which a [`InitialCondition::Split`] lattice is halved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitAxis {
    /// Top half / bottom half.
    Rows,
    /// Left half / right half.
    Columns,
}

/// Enumerated initial-condition descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InitialCondition<S> {
    /// Every cell holds `value`.
    Uniform {
        /// State assigned to every cell.
        value: S,
    },
    /// Every cell drawn independently from the weighted domain.
    Random {
        /// Weighted states; the weights need not sum to one.
        weights: Vec<Weighted<S>>,
    },
    /// `off` everywhere except the cells of a named pattern, which hold `on`.
    Pattern {
        /// Pattern anchored at the grid centre.
        pattern: Pattern,
        /// State of pattern cells.
        on: S,
        /// State of every other cell.
        off: S,
    },
    /// Half the lattice holds `first`, the other half `second`.
    Split {
        /// Axis along which the grid is halved.
        axis: SplitAxis,
        /// State of the first `N/2` rows or columns.
        first: S,
        /// State of the remaining rows or columns.
        second: S,
    },
}

impl<S: CellState> InitialCondition<S> {
    /// Uniform lattice shorthand.
    pub fn uniform(value: S) -> Self {
        InitialCondition::Uniform { value }
    }

    /// IID lattice drawing each of `states` with equal probability.
    pub fn equal_weights(states: &[S]) -> Self {
        InitialCondition::Random {
            weights: states
                .iter()
                .map(|&state| Weighted { state, weight: 1.0 })
                .collect(),
        }
    }

    /// Named pattern shorthand.
    pub fn pattern(pattern: Pattern, on: S, off: S) -> Self {
        InitialCondition::Pattern { pattern, on, off }
    }

    /// Checks the descriptor is usable before any cell is written.
    pub fn validate(&self) -> Result<(), ToroidError> {
        if let InitialCondition::Random { weights } = self {
            let invalid = weights
                .iter()
                .any(|entry| !entry.weight.is_finite() || entry.weight < 0.0);
            let total: f64 = weights.iter().map(|entry| entry.weight).sum();
            if weights.is_empty() || invalid || total <= 0.0 {
                return Err(ToroidError::Lattice(
                    ErrorInfo::new(
                        "invalid-weights",
                        "random initial condition needs finite non-negative weights with a positive sum",
                    )
                    .with_context("entries", weights.len().to_string())
                    .with_context("total", total.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Produces the value of every cell in row-major order.
    pub(crate) fn populate<R>(&self, size: usize, rng: &mut R) -> Vec<S>
    where
        R: RandomSource + ?Sized,
    {
        let len = size * size;
        match self {
            InitialCondition::Uniform { value } => vec![*value; len],
            InitialCondition::Random { weights } => {
                let total: f64 = weights.iter().map(|entry| entry.weight).sum();
                (0..len)
                    .map(|_| {
                        let target = rng.uniform() * total;
                        let mut cumulative = 0.0;
                        for entry in weights {
                            cumulative += entry.weight;
                            if target < cumulative {
                                return entry.state;
                            }
                        }
                        // rounding can leave `target` just above the final edge
                        weights
                            .iter()
                            .rev()
                            .find(|entry| entry.weight > 0.0)
                            .map(|entry| entry.state)
                            .unwrap_or(weights[0].state)
                    })
                    .collect()
            }
            InitialCondition::Pattern { pattern, on, off } => {
                let mut cells = vec![*off; len];
                let n = size as isize;
                for (row, col) in pattern.cells(size) {
                    let site = row.rem_euclid(n) as usize * size + col.rem_euclid(n) as usize;
                    cells[site] = *on;
                }
                cells
            }
            InitialCondition::Split {
                axis,
                first,
                second,
            } => {
                let half = size / 2;
                (0..len)
                    .map(|site| {
                        let coordinate = match axis {
                            SplitAxis::Rows => site / size,
                            SplitAxis::Columns => site % size,
                        };
                        if coordinate < half {
                            *first
                        } else {
                            *second
                        }
                    })
                    .collect()
            }
        }
    }
}
