#![deny(missing_docs)]

//! Update rules, sweep scheduling, sampling and run orchestration for the
//! toroidal lattice models (Ising, SIRS and Game of Life).

/// Sample schedules, accumulators and per-model statistics.
pub mod accumulator;
/// Resampling error estimator.
pub mod bootstrap;
/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Run orchestration and serializable summaries.
pub mod driver;
/// Live-count equilibration detection for Life.
pub mod equilibration;
/// Welford running moments.
pub mod moments;
/// Game of Life rule.
pub mod moves_life;
/// SIRS transition rule.
pub mod moves_sirs;
/// Glauber and Kawasaki spin dynamics.
pub mod moves_spin;
/// Observables and the pure functions derived from sample sequences.
pub mod observables;
/// The update-rule trait and shared acceptance helpers.
pub mod rule;
/// Parallel parameter scans.
pub mod scan;
/// Sweep scheduler.
pub mod sweep;

pub use accumulator::{ObservableAccumulator, SampleSchedule};
pub use bootstrap::BootstrapEstimator;
pub use config::{
    EquilibrationTrials, GliderConfig, ImmunityScan, InfectionScan, IsingConfig, LifeConfig,
    PhasePlaneScan, SamplingConfig, SeedPolicy, SirsConfig, TemperatureScan, ValueRange,
};
pub use driver::{
    equilibrate, run_ising, run_ising_with, run_life_equilibration, run_sirs, run_sirs_with,
    track_glider, EquilibrationReport, GliderTrack, IsingSummary, Outcome, SimulationRun,
    SirsSummary, TrackPoint,
};
pub use equilibration::{Equilibration, EquilibrationDetector, Observation};
pub use moves_life::LifeRule;
pub use moves_sirs::Sirs;
pub use moves_spin::{Glauber, Kawasaki, SpinDynamics, SpinDynamicsKind};
pub use rule::{AttemptOutcome, SweepKind, UpdateRule};
pub use sweep::{sweep, SweepStats};
