//! Square lattice with periodic (toroidal) boundaries.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::errors::ToroidError;
use crate::init::InitialCondition;
use crate::rng::RandomSource;
use crate::state::CellState;

/// Compass direction of a von Neumann neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `(row - 1, col)`.
    North,
    /// `(row + 1, col)`.
    South,
    /// `(row, col + 1)`.
    East,
    /// `(row, col - 1)`.
    West,
}

impl Direction {
    /// All four directions in N, S, E, W order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Row and column displacement of the direction.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }
}

/// Neighbourhood shape used by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighborhood {
    /// Four orthogonal neighbours (Ising, SIRS).
    VonNeumann,
    /// Eight surrounding neighbours (Game of Life).
    Moore,
}

const VON_NEUMANN_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, 1), (0, -1)];

const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Neighborhood {
    /// Row and column displacements of every neighbour.
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::VonNeumann => &VON_NEUMANN_OFFSETS,
            Neighborhood::Moore => &MOORE_OFFSETS,
        }
    }
}

/// Fixed-size `N x N` lattice stored row-major.
///
/// Every coordinate accepted by the public API is reduced modulo `N`, so no
/// access can fall outside the grid. A second buffer of the same length is
/// allocated up front for synchronous whole-grid passes.
#[derive(Debug, Clone)]
pub struct Lattice<S> {
    size: usize,
    cells: Vec<S>,
    back: Vec<S>,
}

impl<S: PartialEq> PartialEq for Lattice<S> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.cells == other.cells
    }
}

impl<S: Eq> Eq for Lattice<S> {}

impl<S: CellState> Lattice<S> {
    /// Builds a lattice from an initial-condition descriptor.
    pub fn new<R>(
        size: usize,
        init: &InitialCondition<S>,
        rng: &mut R,
    ) -> Result<Self, ToroidError>
    where
        R: RandomSource + ?Sized,
    {
        check_size(size)?;
        init.validate()?;
        let cells = init.populate(size, rng);
        Ok(Self::from_parts(size, cells))
    }

    /// Builds a lattice holding `value` everywhere.
    pub fn uniform(size: usize, value: S) -> Result<Self, ToroidError> {
        check_size(size)?;
        Ok(Self::from_parts(size, vec![value; size * size]))
    }

    /// Builds a lattice from explicit row-major cells.
    pub fn from_cells(size: usize, cells: Vec<S>) -> Result<Self, ToroidError> {
        check_size(size)?;
        if cells.len() != size * size {
            return Err(ToroidError::invalid_cells(size, cells.len()));
        }
        Ok(Self::from_parts(size, cells))
    }

    fn from_parts(size: usize, cells: Vec<S>) -> Self {
        let back = cells.clone();
        Self { size, cells, back }
    }

    /// Side length `N`.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells, `N^2`.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`: zero-sized lattices cannot be constructed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reduces a signed coordinate modulo `N`.
    #[inline]
    pub fn wrap(&self, index: isize) -> usize {
        index.rem_euclid(self.size as isize) as usize
    }

    /// Flat row-major index of `(row, col)` after wrapping.
    #[inline]
    pub fn site(&self, row: isize, col: isize) -> usize {
        self.wrap(row) * self.size + self.wrap(col)
    }

    /// `(row, col)` of a flat index.
    #[inline]
    pub fn coords(&self, site: usize) -> (usize, usize) {
        let site = site % self.cells.len();
        (site / self.size, site % self.size)
    }

    /// State at `(row, col)`.
    #[inline]
    pub fn get(&self, row: isize, col: isize) -> S {
        self.cells[self.site(row, col)]
    }

    /// Overwrites the state at `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: isize, col: isize, value: S) {
        let site = self.site(row, col);
        self.cells[site] = value;
    }

    /// State at a flat index (reduced modulo `N^2`).
    #[inline]
    pub fn get_site(&self, site: usize) -> S {
        self.cells[site % self.cells.len()]
    }

    /// Overwrites the state at a flat index (reduced modulo `N^2`).
    #[inline]
    pub fn set_site(&mut self, site: usize, value: S) {
        let len = self.cells.len();
        self.cells[site % len] = value;
    }

    /// Exchanges the states of two flat indices.
    #[inline]
    pub fn swap_sites(&mut self, a: usize, b: usize) {
        let len = self.cells.len();
        self.cells.swap(a % len, b % len);
    }

    /// Neighbouring state in the given direction.
    #[inline]
    pub fn neighbor(&self, row: isize, col: isize, direction: Direction) -> S {
        let (dr, dc) = direction.offset();
        self.get(row + dr, col + dc)
    }

    /// The four von Neumann neighbours in N, S, E, W order.
    #[inline]
    pub fn von_neumann(&self, row: isize, col: isize) -> [S; 4] {
        Direction::ALL.map(|direction| self.neighbor(row, col, direction))
    }

    /// The eight Moore neighbours, row by row from the top-left.
    #[inline]
    pub fn moore(&self, row: isize, col: isize) -> [S; 8] {
        MOORE_OFFSETS.map(|(dr, dc)| self.get(row + dr, col + dc))
    }

    /// Neighbouring states for an arbitrary neighbourhood shape.
    pub fn neighbors(
        &self,
        row: isize,
        col: isize,
        neighborhood: Neighborhood,
    ) -> impl Iterator<Item = S> + '_ {
        neighborhood
            .offsets()
            .iter()
            .map(move |&(dr, dc)| self.get(row + dr, col + dc))
    }

    /// Whether two flat indices are von Neumann neighbours on the torus.
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        let (row, col) = self.coords(a);
        let target = b % self.cells.len();
        VON_NEUMANN_OFFSETS
            .iter()
            .any(|&(dr, dc)| self.site(row as isize + dr, col as isize + dc) == target)
    }

    /// Row-major view of every cell.
    #[inline]
    pub fn cells(&self) -> &[S] {
        &self.cells
    }

    /// Number of cells holding `value`.
    pub fn count(&self, value: S) -> usize {
        self.cells.iter().filter(|&&cell| cell == value).count()
    }

    /// Sorted `(row, col)` coordinates of every cell holding `value`.
    pub fn coordinates_of(&self, value: S) -> BTreeSet<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &cell)| cell == value)
            .map(|(site, _)| (site / self.size, site % self.size))
            .collect()
    }

    /// Rewrites every cell from a snapshot of the current grid.
    ///
    /// `rule` sees the lattice exactly as it was before the pass; results are
    /// written into the back buffer and the buffers are swapped once every
    /// cell has been computed.
    pub fn update_synchronous<F>(&mut self, mut rule: F)
    where
        F: FnMut(&Self, isize, isize) -> S,
    {
        let mut back = std::mem::take(&mut self.back);
        for row in 0..self.size {
            for col in 0..self.size {
                back[row * self.size + col] = rule(self, row as isize, col as isize);
            }
        }
        std::mem::swap(&mut self.cells, &mut back);
        self.back = back;
    }

    /// Hex SHA-256 over the side length and the cell codes.
    pub fn canonical_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.size as u64).to_le_bytes());
        let codes: Vec<u8> = self.cells.iter().map(|cell| cell.code()).collect();
        hasher.update(&codes);
        format!("{:x}", hasher.finalize())
    }
}

fn check_size(size: usize) -> Result<(), ToroidError> {
    if size == 0 {
        return Err(ToroidError::invalid_size(size));
    }
    Ok(())
}
