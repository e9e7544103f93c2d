use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use toroid_core::{CellState, Epidemic, Lattice, Life, Spin};

use crate::moments::RunningMoments;

/// Net magnetisation `sum(s)`.
pub fn magnetization(lattice: &Lattice<Spin>) -> i64 {
    lattice
        .cells()
        .iter()
        .map(|spin| i64::from(spin.value()))
        .sum()
}

/// Total energy `-1/2 * sum_ij s_ij * sum(neighbours_ij)`.
///
/// Each bond is visited from both ends, so the halved sum is exact.
pub fn total_energy(lattice: &Lattice<Spin>) -> i64 {
    let size = lattice.size() as isize;
    let mut doubled = 0i64;
    for row in 0..size {
        for col in 0..size {
            let field: i32 = lattice
                .von_neumann(row, col)
                .iter()
                .map(|spin| spin.value())
                .sum();
            doubled += i64::from(lattice.get(row, col).value()) * i64::from(field);
        }
    }
    -doubled / 2
}

/// Number of infected cells.
pub fn infected_count(lattice: &Lattice<Epidemic>) -> usize {
    lattice.count(Epidemic::Infected)
}

/// Number of live cells.
pub fn live_count(lattice: &Lattice<Life>) -> usize {
    lattice.count(Life::Alive)
}

/// Ising observables captured at one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinSnapshot {
    /// Net magnetisation.
    pub magnetization: i64,
    /// Total energy.
    pub energy: i64,
}

/// SIRS observables captured at one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpidemicSnapshot {
    /// Infected cells.
    pub infected: usize,
}

/// Game of Life observables captured at one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSnapshot {
    /// Live cells.
    pub live: usize,
}

/// Cell domains that know which observables to read off a lattice.
pub trait Observe: CellState {
    /// Observables captured per sample.
    type Snapshot: Copy + Debug + PartialEq + Serialize;

    /// Reads the current observables.
    fn observe(lattice: &Lattice<Self>) -> Self::Snapshot;
}

impl Observe for Spin {
    type Snapshot = SpinSnapshot;

    fn observe(lattice: &Lattice<Self>) -> SpinSnapshot {
        SpinSnapshot {
            magnetization: magnetization(lattice),
            energy: total_energy(lattice),
        }
    }
}

impl Observe for Epidemic {
    type Snapshot = EpidemicSnapshot;

    fn observe(lattice: &Lattice<Self>) -> EpidemicSnapshot {
        EpidemicSnapshot {
            infected: infected_count(lattice),
        }
    }
}

impl Observe for Life {
    type Snapshot = LifeSnapshot;

    fn observe(lattice: &Lattice<Self>) -> LifeSnapshot {
        LifeSnapshot {
            live: live_count(lattice),
        }
    }
}

/// Sample mean, `0` for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    samples.iter().copied().collect::<RunningMoments>().mean()
}

/// Population variance `<x^2> - <x>^2`.
pub fn variance(samples: &[f64]) -> f64 {
    samples.iter().copied().collect::<RunningMoments>().variance()
}

/// `(<M^2> - <M>^2) / (N^2 T)`.
pub fn susceptibility(magnetizations: &[f64], cells: usize, temperature: f64) -> f64 {
    variance(magnetizations) / (cells as f64 * temperature)
}

/// `(<E^2> - <E>^2) / (N^2 T^2)`.
pub fn heat_capacity(energies: &[f64], cells: usize, temperature: f64) -> f64 {
    variance(energies) / (cells as f64 * temperature * temperature)
}

/// `(<n^2> - <n>^2) / N^2` for infected counts `n`.
pub fn infected_variance(counts: &[f64], cells: usize) -> f64 {
    variance(counts) / cells as f64
}

/// `<n> / N^2` for infected counts `n`.
pub fn infected_fraction(counts: &[f64], cells: usize) -> f64 {
    mean(counts) / cells as f64
}

/// Mean `(row, col)` of the cells holding `value`, `None` if there are none.
///
/// Coordinates are taken as stored, without unwrapping across the seam.
pub fn centre_of_mass<S: CellState>(lattice: &Lattice<S>, value: S) -> Option<(f64, f64)> {
    let coordinates = lattice.coordinates_of(value);
    if coordinates.is_empty() {
        return None;
    }
    let count = coordinates.len() as f64;
    let (rows, cols) = coordinates
        .iter()
        .fold((0.0, 0.0), |(rows, cols), &(row, col)| {
            (rows + row as f64, cols + col as f64)
        });
    Some((rows / count, cols / count))
}

/// Row and column extents (`max - min`) of the cells holding `value`.
pub fn extent<S: CellState>(lattice: &Lattice<S>, value: S) -> Option<(usize, usize)> {
    let coordinates = lattice.coordinates_of(value);
    let first = coordinates.iter().next()?;
    let (mut min_row, mut max_row) = (first.0, first.0);
    let (mut min_col, mut max_col) = (first.1, first.1);
    for &(row, col) in &coordinates {
        min_row = min_row.min(row);
        max_row = max_row.max(row);
        min_col = min_col.min(col);
        max_col = max_col.max(col);
    }
    Some((max_row - min_row, max_col - min_col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_lattice_energy_is_minus_two_per_cell() {
        for size in [1, 2, 3, 8] {
            let lattice = Lattice::uniform(size, Spin::Down).unwrap();
            assert_eq!(total_energy(&lattice), -2 * (size * size) as i64);
            assert_eq!(magnetization(&lattice), -((size * size) as i64));
        }
    }

    #[test]
    fn single_defect_raises_energy_by_eight() {
        let mut lattice = Lattice::uniform(5, Spin::Up).unwrap();
        lattice.set(2, 2, Spin::Down);
        assert_eq!(total_energy(&lattice), -50 + 8);
        assert_eq!(magnetization(&lattice), 23);
    }

    #[test]
    fn derived_quantities_match_hand_values() {
        let samples = [2.0, 4.0, 4.0, 6.0];
        assert!((variance(&samples) - 2.0).abs() < 1e-12);
        assert!((susceptibility(&samples, 4, 0.5) - 1.0).abs() < 1e-12);
        assert!((heat_capacity(&samples, 4, 0.5) - 2.0).abs() < 1e-12);
        assert!((infected_variance(&samples, 4) - 0.5).abs() < 1e-12);
        assert!((infected_fraction(&samples, 4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn centre_of_mass_and_extent() {
        let mut lattice = Lattice::uniform(6, Life::Dead).unwrap();
        assert_eq!(centre_of_mass(&lattice, Life::Alive), None);
        lattice.set(1, 1, Life::Alive);
        lattice.set(3, 2, Life::Alive);
        assert_eq!(centre_of_mass(&lattice, Life::Alive), Some((2.0, 1.5)));
        assert_eq!(extent(&lattice, Life::Alive), Some((2, 1)));
    }
}
