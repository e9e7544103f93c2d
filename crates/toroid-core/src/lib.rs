#![deny(missing_docs)]
#![doc = "Toroidal lattice, closed cell-state domains and seeded randomness shared by the toroid simulators."]

pub mod errors;
pub mod init;
pub mod lattice;
pub mod rng;
pub mod state;

pub use errors::{ErrorInfo, ToroidError};
pub use init::{InitialCondition, Pattern, SplitAxis, Weighted};
pub use lattice::{Direction, Lattice, Neighborhood};
pub use rng::{derive_substream_seed, RandomSource, RngHandle};
pub use state::{CellState, Epidemic, Life, Spin};
