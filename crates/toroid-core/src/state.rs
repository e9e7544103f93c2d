//! Closed cell-state domains for the three models.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Value stored in a lattice cell.
///
/// Implementors are small closed enums, so a lattice can never hold a value
/// outside its model's domain.
pub trait CellState: Copy + Eq + Debug + Send + Sync + 'static {
    /// Every member of the domain, in code order.
    const DOMAIN: &'static [Self];

    /// Stable single-byte code used for hashing and tabular export.
    fn code(self) -> u8;
}

/// Ising spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spin {
    /// `+1`.
    Up,
    /// `-1`.
    Down,
}

impl Spin {
    /// Returns the signed spin value.
    #[inline]
    pub fn value(self) -> i32 {
        match self {
            Spin::Up => 1,
            Spin::Down => -1,
        }
    }

    /// Returns the opposite spin.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Spin::Up => Spin::Down,
            Spin::Down => Spin::Up,
        }
    }
}

impl CellState for Spin {
    const DOMAIN: &'static [Self] = &[Spin::Up, Spin::Down];

    fn code(self) -> u8 {
        match self {
            Spin::Up => 0,
            Spin::Down => 1,
        }
    }
}

/// SIRS epidemic state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Epidemic {
    /// Can be infected by an infected neighbour.
    Susceptible,
    /// Infectious; recovers with probability `p2`.
    Infected,
    /// Temporarily immune; becomes susceptible with probability `p3`.
    Recovered,
    /// Permanently immune; absorbing.
    Immune,
}

impl CellState for Epidemic {
    const DOMAIN: &'static [Self] = &[
        Epidemic::Susceptible,
        Epidemic::Infected,
        Epidemic::Recovered,
        Epidemic::Immune,
    ];

    fn code(self) -> u8 {
        match self {
            Epidemic::Susceptible => 0,
            Epidemic::Infected => 1,
            Epidemic::Recovered => 2,
            Epidemic::Immune => 3,
        }
    }
}

/// Game of Life cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Life {
    /// Empty cell.
    Dead,
    /// Occupied cell.
    Alive,
}

impl Life {
    /// Returns `true` for [`Life::Alive`].
    #[inline]
    pub fn is_alive(self) -> bool {
        matches!(self, Life::Alive)
    }
}

impl CellState for Life {
    const DOMAIN: &'static [Self] = &[Life::Dead, Life::Alive];

    fn code(self) -> u8 {
        match self {
            Life::Dead => 0,
            Life::Alive => 1,
        }
    }
}
