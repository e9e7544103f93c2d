pub mod ising;
pub mod life;
pub mod sirs;
