use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use toroid_core::errors::ErrorInfo;
use toroid_core::{
    Epidemic, InitialCondition, Life, RandomSource, SplitAxis, Spin, ToroidError, Weighted,
};

use crate::accumulator::SampleSchedule;
use crate::bootstrap::{BootstrapEstimator, DEFAULT_RESAMPLES};
use crate::equilibration::{DEFAULT_CAP, DEFAULT_WINDOW};
use crate::moves_spin::{SpinDynamicsKind, DEFAULT_MAX_PAIR_DRAWS};
use crate::rule::{check_probability, check_temperature};

/// Sweep count, burn-in and sampling stride of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Total sweeps, burn-in included.
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,
    /// Sweeps discarded before the first sample.
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,
    /// Sweeps between samples.
    #[serde(default = "default_stride")]
    pub stride: usize,
}

fn default_sweeps() -> usize {
    1000
}

fn default_burn_in() -> usize {
    100
}

fn default_stride() -> usize {
    1
}

impl SamplingConfig {
    /// Builds a sampling block.
    pub fn new(sweeps: usize, burn_in: usize, stride: usize) -> Self {
        Self {
            sweeps,
            burn_in,
            stride,
        }
    }

    /// Validated schedule.
    pub fn schedule(&self) -> Result<SampleSchedule, ToroidError> {
        let schedule = SampleSchedule::new(self.burn_in, self.stride)?;
        if schedule.expected_samples(self.sweeps) == 0 {
            return Err(ToroidError::Config(
                ErrorInfo::new("no-samples", "sweeps do not extend past the burn-in")
                    .with_context("sweeps", self.sweeps.to_string())
                    .with_context("burn_in", self.burn_in.to_string()),
            ));
        }
        Ok(schedule)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::new(default_sweeps(), default_burn_in(), default_stride())
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed of the run or scan.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Free-form label copied into summaries.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Ising run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsingConfig {
    /// Side length `N`.
    #[serde(default = "default_size")]
    pub size: usize,
    /// Temperature `T`.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Glauber or Kawasaki.
    #[serde(default = "default_dynamics")]
    pub dynamics: SpinDynamicsKind,
    /// Sweeps, burn-in and stride.
    #[serde(default = "default_ising_sampling")]
    pub sampling: SamplingConfig,
    /// Bootstrap replicates per error bar.
    #[serde(default = "default_resamples")]
    pub bootstrap_resamples: usize,
    /// Kawasaki budget for finding an unlike pair.
    #[serde(default = "default_max_pair_draws")]
    pub max_pair_draws: usize,
    /// Starting lattice; defaults depend on the dynamics.
    #[serde(default)]
    pub initial: Option<InitialCondition<Spin>>,
    /// Master seed and label.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_size() -> usize {
    50
}

fn default_temperature() -> f64 {
    1.0
}

fn default_dynamics() -> SpinDynamicsKind {
    SpinDynamicsKind::Glauber
}

fn default_ising_sampling() -> SamplingConfig {
    SamplingConfig::new(10_000, 100, 10)
}

fn default_resamples() -> usize {
    DEFAULT_RESAMPLES
}

fn default_max_pair_draws() -> usize {
    DEFAULT_MAX_PAIR_DRAWS
}

impl Default for IsingConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            temperature: default_temperature(),
            dynamics: default_dynamics(),
            sampling: default_ising_sampling(),
            bootstrap_resamples: default_resamples(),
            max_pair_draws: default_max_pair_draws(),
            initial: None,
            seed_policy: SeedPolicy::default(),
        }
    }
}

impl IsingConfig {
    /// Checks every parameter before a run starts.
    pub fn validate(&self) -> Result<(), ToroidError> {
        check_size(self.size)?;
        check_temperature(self.temperature)?;
        self.sampling.schedule()?;
        BootstrapEstimator::new(self.bootstrap_resamples)?;
        if let Some(initial) = &self.initial {
            initial.validate()?;
        }
        Ok(())
    }

    /// Explicit initial condition, or a randomly oriented ordered start:
    /// all up or all down for Glauber, one of the four half splits for
    /// Kawasaki (zero net magnetisation). Orientation comes from `rng`.
    pub fn initial_condition<R>(&self, rng: &mut R) -> InitialCondition<Spin>
    where
        R: RandomSource + ?Sized,
    {
        match (&self.initial, self.dynamics) {
            (Some(initial), _) => initial.clone(),
            (None, SpinDynamicsKind::Glauber) => {
                InitialCondition::uniform(if rng.index(2) == 0 { Spin::Up } else { Spin::Down })
            }
            (None, SpinDynamicsKind::Kawasaki) => {
                let axis = if rng.index(2) == 0 { SplitAxis::Columns } else { SplitAxis::Rows };
                let (first, second) = if rng.index(2) == 0 {
                    (Spin::Up, Spin::Down)
                } else {
                    (Spin::Down, Spin::Up)
                };
                InitialCondition::Split { axis, first, second }
            }
        }
    }
}

impl Default for SirsConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            p1: default_probability(),
            p2: default_probability(),
            p3: default_probability(),
            immunity_fraction: 0.0,
            sampling: SamplingConfig::default(),
            bootstrap_resamples: default_resamples(),
            initial: None,
            seed_policy: SeedPolicy::default(),
        }
    }
}

impl SirsConfig {
    /// Checks every parameter before a run starts.
    pub fn validate(&self) -> Result<(), ToroidError> {
        check_size(self.size)?;
        check_probability("p1", self.p1)?;
        check_probability("p2", self.p2)?;
        check_probability("p3", self.p3)?;
        check_probability("immunity_fraction", self.immunity_fraction)?;
        self.sampling.schedule()?;
        BootstrapEstimator::new(self.bootstrap_resamples)?;
        self.initial_condition().validate()
    }

    /// Explicit initial condition, or S, I and R with weight `(1 - f) / 3`
    /// each and Immune with weight `f`.
    pub fn initial_condition(&self) -> InitialCondition<Epidemic> {
        if let Some(initial) = &self.initial {
            return initial.clone();
        }
        let share = (1.0 - self.immunity_fraction) / 3.0;
        InitialCondition::Random {
            weights: vec![
                Weighted {
                    state: Epidemic::Susceptible,
                    weight: share,
                },
                Weighted {
                    state: Epidemic::Infected,
                    weight: share,
                },
                Weighted {
                    state: Epidemic::Recovered,
                    weight: share,
                },
                Weighted {
                    state: Epidemic::Immune,
                    weight: self.immunity_fraction,
                },
            ],
        }
    }
}

/// Game of Life equilibration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeConfig {
    /// Side length `N`.
    #[serde(default = "default_size")]
    pub size: usize,
    /// Starting lattice; defaults to 50% alive.
    #[serde(default)]
    pub initial: Option<InitialCondition<Life>>,
    /// Equal counts required.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Sweeps before giving up.
    #[serde(default = "default_cap")]
    pub cap: usize,
    /// Master seed and label.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_cap() -> usize {
    DEFAULT_CAP
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            initial: None,
            window: default_window(),
            cap: default_cap(),
            seed_policy: SeedPolicy::default(),
        }
    }
}

impl LifeConfig {
    /// Checks every parameter before a run starts.
    pub fn validate(&self) -> Result<(), ToroidError> {
        check_size(self.size)?;
        check_positive("window", self.window)?;
        check_positive("cap", self.cap)?;
        self.initial_condition().validate()
    }

    /// Explicit initial condition or an even dead/alive draw.
    pub fn initial_condition(&self) -> InitialCondition<Life> {
        self.initial
            .clone()
            .unwrap_or_else(|| InitialCondition::equal_weights(&[Life::Dead, Life::Alive]))
    }
}

/// Glider tracking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GliderConfig {
    /// Side length `N`.
    #[serde(default = "default_size")]
    pub size: usize,
    /// Sweeps to run.
    #[serde(default = "default_glider_sweeps")]
    pub sweeps: usize,
    /// Sweeps between centre-of-mass readings.
    #[serde(default = "default_interval")]
    pub interval: usize,
    /// Readings are kept only while both extents stay below this.
    #[serde(default = "default_max_extent")]
    pub max_extent: usize,
}

fn default_glider_sweeps() -> usize {
    300
}

fn default_interval() -> usize {
    4
}

fn default_max_extent() -> usize {
    5
}

impl Default for GliderConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            sweeps: default_glider_sweeps(),
            interval: default_interval(),
            max_extent: default_max_extent(),
        }
    }
}

impl GliderConfig {
    /// Checks every parameter before a run starts.
    pub fn validate(&self) -> Result<(), ToroidError> {
        check_size(self.size)?;
        check_positive("interval", self.interval)?;
        check_positive("max_extent", self.max_extent)
    }
}

/// Values taken by a scanned parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ValueRange {
    /// `count` evenly spaced values from `start` to `stop` inclusive.
    Linspace {
        /// First value.
        start: f64,
        /// Last value.
        stop: f64,
        /// Number of values.
        count: usize,
    },
    /// `start, start + step, ...` up to and including `stop`.
    Step {
        /// First value.
        start: f64,
        /// Upper bound.
        stop: f64,
        /// Increment.
        step: f64,
    },
    /// Explicit list.
    List {
        /// Values in scan order.
        values: Vec<f64>,
    },
}

impl ValueRange {
    /// Checks the range produces at least one finite value.
    pub fn validate(&self) -> Result<(), ToroidError> {
        let invalid = match self {
            ValueRange::Linspace { start, stop, count } => {
                *count == 0 || !start.is_finite() || !stop.is_finite()
            }
            ValueRange::Step { start, stop, step } => {
                !start.is_finite()
                    || !stop.is_finite()
                    || !step.is_finite()
                    || *step <= 0.0
                    || stop < start
            }
            ValueRange::List { values } => {
                values.is_empty() || values.iter().any(|value| !value.is_finite())
            }
        };
        if invalid {
            return Err(ToroidError::Config(
                ErrorInfo::new("invalid-range", "scan range must yield finite values")
                    .with_context("range", format!("{self:?}")),
            ));
        }
        Ok(())
    }

    /// Materialises the range.
    pub fn values(&self) -> Vec<f64> {
        match self {
            ValueRange::Linspace { start, stop, count } => match count {
                0 => Vec::new(),
                1 => vec![*start],
                _ => {
                    let last = *count - 1;
                    let spacing = (stop - start) / last as f64;
                    (0..*count)
                        .map(|i| if i == last { *stop } else { start + spacing * i as f64 })
                        .collect()
                }
            },
            ValueRange::Step { start, stop, step } => {
                if *step <= 0.0 || stop < start {
                    return Vec::new();
                }
                let steps = ((stop - start) / step + 1e-9).floor() as usize;
                (0..=steps).map(|i| start + step * i as f64).collect()
            }
            ValueRange::List { values } => values.clone(),
        }
    }
}

/// Ising runs over a temperature range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureScan {
    /// Parameters shared by every point; `temperature` is overridden.
    #[serde(default)]
    pub base: IsingConfig,
    /// Temperatures in scan order.
    #[serde(default = "default_temperatures")]
    pub temperatures: ValueRange,
    /// Start each temperature from the previous final lattice.
    #[serde(default = "default_anneal")]
    pub anneal: bool,
}

fn default_temperatures() -> ValueRange {
    ValueRange::Step {
        start: 1.0,
        stop: 3.0,
        step: 0.1,
    }
}

fn default_anneal() -> bool {
    true
}

impl Default for TemperatureScan {
    fn default() -> Self {
        Self {
            base: IsingConfig::default(),
            temperatures: default_temperatures(),
            anneal: default_anneal(),
        }
    }
}

/// Average infected fraction over a `(p1, p3)` grid at fixed `p2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePlaneScan {
    /// Parameters shared by every point; `p1` and `p3` are overridden.
    #[serde(default)]
    pub base: SirsConfig,
    /// Infection probabilities.
    #[serde(default = "default_plane_axis")]
    pub p1: ValueRange,
    /// Waning probabilities.
    #[serde(default = "default_plane_axis")]
    pub p3: ValueRange,
}

fn default_plane_axis() -> ValueRange {
    ValueRange::Step {
        start: 0.0,
        stop: 0.95,
        step: 0.05,
    }
}

impl Default for PhasePlaneScan {
    fn default() -> Self {
        Self {
            base: SirsConfig::default(),
            p1: default_plane_axis(),
            p3: default_plane_axis(),
        }
    }
}

fn default_long_sirs() -> SirsConfig {
    SirsConfig {
        sampling: SamplingConfig::new(10_000, 100, 1),
        ..SirsConfig::default()
    }
}

/// Infected-count variance along a cut in `p1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionScan {
    /// Parameters shared by every point; `p1` is overridden.
    #[serde(default = "default_long_sirs")]
    pub base: SirsConfig,
    /// Infection probabilities.
    #[serde(default = "default_infection_axis")]
    pub p1: ValueRange,
}

fn default_infection_axis() -> ValueRange {
    ValueRange::Linspace {
        start: 0.2,
        stop: 0.5,
        count: 40,
    }
}

impl Default for InfectionScan {
    fn default() -> Self {
        Self {
            base: default_long_sirs(),
            p1: default_infection_axis(),
        }
    }
}

/// Average infected fraction against the immune fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmunityScan {
    /// Parameters shared by every point; `immunity_fraction` is overridden.
    #[serde(default = "default_long_sirs")]
    pub base: SirsConfig,
    /// Immune fractions.
    #[serde(default = "default_fractions")]
    pub fractions: ValueRange,
}

fn default_fractions() -> ValueRange {
    ValueRange::Linspace {
        start: 0.0,
        stop: 1.0,
        count: 100,
    }
}

impl Default for ImmunityScan {
    fn default() -> Self {
        Self {
            base: default_long_sirs(),
            fractions: default_fractions(),
        }
    }
}

/// Repeated Life equilibration runs from independent random grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibrationTrials {
    /// Parameters shared by every trial.
    #[serde(default)]
    pub base: LifeConfig,
    /// Number of trials.
    #[serde(default = "default_trials")]
    pub trials: usize,
}

fn default_trials() -> usize {
    1000
}

impl Default for EquilibrationTrials {
    fn default() -> Self {
        Self {
            base: LifeConfig::default(),
            trials: default_trials(),
        }
    }
}

/// Reads and parses a YAML configuration file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ToroidError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        ToroidError::Config(
            ErrorInfo::new("config-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    from_yaml_str(&contents).map_err(|err| match err {
        ToroidError::Config(info) => {
            ToroidError::Config(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Parses a YAML configuration document.
pub fn from_yaml_str<T: DeserializeOwned>(contents: &str) -> Result<T, ToroidError> {
    serde_yaml::from_str(contents).map_err(|err| {
        ToroidError::Config(ErrorInfo::new("config-parse", err.to_string()))
    })
}

fn check_size(size: usize) -> Result<(), ToroidError> {
    if size == 0 {
        return Err(ToroidError::invalid_size(size));
    }
    Ok(())
}

fn check_positive(name: &str, value: usize) -> Result<(), ToroidError> {
    if value == 0 {
        return Err(ToroidError::Config(
            ErrorInfo::new("invalid-parameter", "parameter must be at least one")
                .with_context("parameter", name),
        ));
    }
    Ok(())
}
