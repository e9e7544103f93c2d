use std::time::Instant;

use serde::{Deserialize, Serialize};
use toroid_core::errors::ErrorInfo;
use toroid_core::{
    CellState, Epidemic, InitialCondition, Lattice, Life, Pattern, RandomSource, RngHandle, Spin,
    ToroidError,
};

use crate::accumulator::{self, ObservableAccumulator, SampleSchedule};
use crate::bootstrap::BootstrapEstimator;
use crate::config::{GliderConfig, IsingConfig, LifeConfig, SirsConfig};
use crate::determinism;
use crate::equilibration::{Equilibration, EquilibrationDetector, Observation};
use crate::moves_life::LifeRule;
use crate::moves_sirs::Sirs;
use crate::moves_spin::{SpinDynamics, SpinDynamicsKind};
use crate::observables::{self, Observe};
use crate::rule::UpdateRule;
use crate::sweep::{self, SweepStats};

/// One lattice evolving under one rule with its own random stream.
#[derive(Debug, Clone)]
pub struct SimulationRun<U: UpdateRule, R = RngHandle> {
    lattice: Lattice<U::State>,
    rule: U,
    rng: R,
    sweeps: usize,
    stats: SweepStats,
}

impl<U, R> SimulationRun<U, R>
where
    U: UpdateRule,
    R: RandomSource,
{
    /// Binds a lattice, a rule and a random source.
    pub fn new(lattice: Lattice<U::State>, rule: U, rng: R) -> Self {
        Self {
            lattice,
            rule,
            rng,
            sweeps: 0,
            stats: SweepStats::default(),
        }
    }

    /// Advances by one sweep.
    pub fn sweep(&mut self) -> Result<SweepStats, ToroidError> {
        let stats = sweep::sweep(&self.rule, &mut self.lattice, &mut self.rng)?;
        self.sweeps += 1;
        self.stats += stats;
        Ok(stats)
    }

    /// Current observables.
    pub fn sample(&self) -> <U::State as Observe>::Snapshot
    where
        U::State: Observe,
    {
        <U::State as Observe>::observe(&self.lattice)
    }

    /// Runs `sweeps` sweeps, sampling after each scheduled sweep.
    ///
    /// `observer` sees the 0-based sweep index and the lattice after every
    /// sweep. Fails with `no-samples` if nothing was scheduled.
    pub fn run<F>(
        &mut self,
        sweeps: usize,
        schedule: SampleSchedule,
        mut observer: F,
    ) -> Result<Vec<<U::State as Observe>::Snapshot>, ToroidError>
    where
        U::State: Observe,
        F: FnMut(usize, &Lattice<U::State>),
    {
        let mut samples = ObservableAccumulator::new(schedule);
        for index in 0..sweeps {
            self.sweep()?;
            observer(index, &self.lattice);
            let lattice = &self.lattice;
            samples.offer(index, || <U::State as Observe>::observe(lattice));
        }
        samples.finish()
    }

    /// Sweeps performed so far.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Accumulated attempt counts.
    pub fn stats(&self) -> SweepStats {
        self.stats
    }

    /// Lattice in its current state.
    pub fn lattice(&self) -> &Lattice<U::State> {
        &self.lattice
    }

    /// Consumes the run and returns its lattice.
    pub fn into_lattice(self) -> Lattice<U::State> {
        self.lattice
    }
}

/// Summary plus the final lattice, for callers that continue from it.
#[derive(Debug, Clone)]
pub struct Outcome<S, T> {
    /// Serializable run summary.
    pub summary: T,
    /// Lattice after the last sweep.
    pub lattice: Lattice<S>,
}

/// Aggregated Ising observables of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsingSummary {
    /// Side length.
    pub size: usize,
    /// Temperature.
    pub temperature: f64,
    /// Dynamics used.
    pub dynamics: SpinDynamicsKind,
    /// Sweeps performed.
    pub sweeps: usize,
    /// Samples recorded.
    pub samples: usize,
    /// `<M>`.
    pub magnetization: f64,
    /// `<|M|>`.
    pub abs_magnetization: f64,
    /// `<E>`.
    pub energy: f64,
    /// Susceptibility.
    pub susceptibility: f64,
    /// Bootstrap error of the susceptibility.
    pub susceptibility_error: f64,
    /// Heat capacity.
    pub heat_capacity: f64,
    /// Bootstrap error of the heat capacity.
    pub heat_capacity_error: f64,
    /// Accepted fraction of attempts.
    pub acceptance_rate: f64,
    /// Canonical hash of the final lattice.
    pub final_lattice_hash: String,
    /// Seed label from the configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Aggregated SIRS observables of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SirsSummary {
    /// Side length.
    pub size: usize,
    /// Infection probability.
    pub p1: f64,
    /// Recovery probability.
    pub p2: f64,
    /// Waning probability.
    pub p3: f64,
    /// Immune fraction of the initial condition.
    pub immunity_fraction: f64,
    /// Sweeps performed.
    pub sweeps: usize,
    /// Samples recorded.
    pub samples: usize,
    /// `<n> / N^2`.
    pub infected_fraction: f64,
    /// `(<n^2> - <n>^2) / N^2`.
    pub infected_variance: f64,
    /// Bootstrap error of the variance.
    pub infected_variance_error: f64,
    /// Fraction of attempts that changed a cell.
    pub acceptance_rate: f64,
    /// Canonical hash of the final lattice.
    pub final_lattice_hash: String,
    /// Seed label from the configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Outcome of one Life equilibration search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquilibrationReport {
    /// Side length.
    pub size: usize,
    /// Sweeps performed.
    pub sweeps: usize,
    /// Live cells before the first sweep.
    pub initial_live: usize,
    /// Live cells after the last sweep.
    pub final_live: usize,
    /// Verdict.
    pub equilibration: Equilibration,
    /// Canonical hash of the final lattice.
    pub final_lattice_hash: String,
}

/// Centre of mass recorded at one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// 0-based sweep index.
    pub sweep: usize,
    /// Mean row of the live cells.
    pub row: f64,
    /// Mean column of the live cells.
    pub col: f64,
}

/// Centre-of-mass trajectory of a glider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GliderTrack {
    /// Side length.
    pub size: usize,
    /// Sweeps performed.
    pub sweeps: usize,
    /// Sweeps between readings.
    pub interval: usize,
    /// Readings taken while the pattern was compact.
    pub points: Vec<TrackPoint>,
    /// Cells per sweep over the first unbroken stretch of readings.
    pub speed: Option<f64>,
    /// Canonical hash of the final lattice.
    pub final_lattice_hash: String,
}

/// Runs Ising dynamics from the configured initial condition.
pub fn run_ising(config: &IsingConfig, seed: u64) -> Result<Outcome<Spin, IsingSummary>, ToroidError> {
    run_ising_with(config, None, seed, |_, _| {})
}

/// Runs Ising dynamics, optionally continuing from `start`.
pub fn run_ising_with<F>(
    config: &IsingConfig,
    start: Option<Lattice<Spin>>,
    seed: u64,
    observer: F,
) -> Result<Outcome<Spin, IsingSummary>, ToroidError>
where
    F: FnMut(usize, &Lattice<Spin>),
{
    config.validate()?;
    let schedule = config.sampling.schedule()?;
    let estimator = BootstrapEstimator::new(config.bootstrap_resamples)?;
    let (mut rng, mut bootstrap_rng) = determinism::run_streams(seed);
    let lattice = prepare(config.size, start, &config.initial_condition(&mut rng), &mut rng)?;
    let dynamics = SpinDynamics::new(config.dynamics, config.temperature, config.max_pair_draws)?;

    let _span = tracing::info_span!(
        "ising",
        dynamics = config.dynamics.as_str(),
        temperature = config.temperature
    )
    .entered();
    let started = Instant::now();
    let mut run = SimulationRun::new(lattice, dynamics, rng);
    let samples = run.run(config.sampling.sweeps, schedule, observer)?;

    let cells = run.lattice().len();
    let temperature = config.temperature;
    let stats = accumulator::spin_statistics(&samples, cells, temperature);
    let (magnetizations, energies) = accumulator::spin_columns(&samples);
    let susceptibility_error = estimator.estimate(&magnetizations, &mut bootstrap_rng, |m| {
        observables::susceptibility(m, cells, temperature)
    })?;
    let heat_capacity_error = estimator.estimate(&energies, &mut bootstrap_rng, |e| {
        observables::heat_capacity(e, cells, temperature)
    })?;

    let acceptance_rate = run.stats().acceptance_rate();
    tracing::debug!(
        samples = samples.len(),
        acceptance_rate,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "ising run finished"
    );
    let lattice = run.into_lattice();
    let summary = IsingSummary {
        size: lattice.size(),
        temperature,
        dynamics: config.dynamics,
        sweeps: config.sampling.sweeps,
        samples: samples.len(),
        magnetization: stats.magnetization,
        abs_magnetization: stats.abs_magnetization,
        energy: stats.energy,
        susceptibility: stats.susceptibility,
        susceptibility_error,
        heat_capacity: stats.heat_capacity,
        heat_capacity_error,
        acceptance_rate,
        final_lattice_hash: lattice.canonical_hash(),
        label: config.seed_policy.label.clone(),
    };
    Ok(Outcome { summary, lattice })
}

/// Runs the SIRS automaton from the configured initial condition.
pub fn run_sirs(config: &SirsConfig, seed: u64) -> Result<Outcome<Epidemic, SirsSummary>, ToroidError> {
    run_sirs_with(config, seed, |_, _| {})
}

/// Runs the SIRS automaton with a per-sweep observer.
pub fn run_sirs_with<F>(
    config: &SirsConfig,
    seed: u64,
    observer: F,
) -> Result<Outcome<Epidemic, SirsSummary>, ToroidError>
where
    F: FnMut(usize, &Lattice<Epidemic>),
{
    config.validate()?;
    let schedule = config.sampling.schedule()?;
    let estimator = BootstrapEstimator::new(config.bootstrap_resamples)?;
    let (mut rng, mut bootstrap_rng) = determinism::run_streams(seed);
    let lattice = Lattice::new(config.size, &config.initial_condition(), &mut rng)?;
    let rule = Sirs::new(config.p1, config.p2, config.p3)?;

    let _span = tracing::info_span!("sirs", p1 = config.p1, p2 = config.p2, p3 = config.p3)
        .entered();
    let started = Instant::now();
    let mut run = SimulationRun::new(lattice, rule, rng);
    let samples = run.run(config.sampling.sweeps, schedule, observer)?;

    let cells = run.lattice().len();
    let stats = accumulator::epidemic_statistics(&samples, cells);
    let counts = accumulator::infected_column(&samples);
    let infected_variance_error = estimator.estimate(&counts, &mut bootstrap_rng, |n| {
        observables::infected_variance(n, cells)
    })?;

    let acceptance_rate = run.stats().acceptance_rate();
    tracing::debug!(
        samples = samples.len(),
        infected_fraction = stats.infected_fraction,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "sirs run finished"
    );
    let lattice = run.into_lattice();
    let summary = SirsSummary {
        size: lattice.size(),
        p1: config.p1,
        p2: config.p2,
        p3: config.p3,
        immunity_fraction: config.immunity_fraction,
        sweeps: config.sampling.sweeps,
        samples: samples.len(),
        infected_fraction: stats.infected_fraction,
        infected_variance: stats.infected_variance,
        infected_variance_error,
        acceptance_rate,
        final_lattice_hash: lattice.canonical_hash(),
        label: config.seed_policy.label.clone(),
    };
    Ok(Outcome { summary, lattice })
}

/// Runs Life until the live count settles or the cap is reached.
pub fn run_life_equilibration(
    config: &LifeConfig,
    seed: u64,
) -> Result<Outcome<Life, EquilibrationReport>, ToroidError> {
    config.validate()?;
    let mut rng = RngHandle::from_seed(seed);
    let lattice = Lattice::new(config.size, &config.initial_condition(), &mut rng)?;
    equilibrate(lattice, config.window, config.cap)
}

/// Runs Life on `lattice` until the live count settles or `cap` sweeps pass.
pub fn equilibrate(
    lattice: Lattice<Life>,
    window: usize,
    cap: usize,
) -> Result<Outcome<Life, EquilibrationReport>, ToroidError> {
    let initial_live = observables::live_count(&lattice);
    let mut detector = EquilibrationDetector::with_limits(initial_live, window, cap);
    let mut run = SimulationRun::new(lattice, LifeRule, RngHandle::from_seed(0));
    let equilibration = loop {
        run.sweep()?;
        if let Observation::Done(verdict) = detector.observe(run.sample().live) {
            break verdict;
        }
    };
    tracing::debug!(sweeps = run.sweeps(), ?equilibration, "life equilibration finished");
    let final_live = run.sample().live;
    let sweeps = run.sweeps();
    let lattice = run.into_lattice();
    let summary = EquilibrationReport {
        size: lattice.size(),
        sweeps,
        initial_live,
        final_live,
        equilibration,
        final_lattice_hash: lattice.canonical_hash(),
    };
    Ok(Outcome { summary, lattice })
}

/// Follows a glider seeded at the grid centre.
pub fn track_glider(config: &GliderConfig) -> Result<GliderTrack, ToroidError> {
    config.validate()?;
    let mut rng = RngHandle::from_seed(0);
    let init = InitialCondition::pattern(Pattern::Glider, Life::Alive, Life::Dead);
    let lattice = Lattice::new(config.size, &init, &mut rng)?;
    let mut run = SimulationRun::new(lattice, LifeRule, rng);
    let mut points = Vec::new();
    for index in 0..config.sweeps {
        run.sweep()?;
        if index % config.interval != 0 {
            continue;
        }
        if let Some(point) = compact_centre(run.lattice(), index, config.max_extent) {
            points.push(point);
        }
    }
    let speed = unbroken_speed(&points, config.interval);
    tracing::debug!(points = points.len(), ?speed, "glider tracked");
    Ok(GliderTrack {
        size: config.size,
        sweeps: config.sweeps,
        interval: config.interval,
        points,
        speed,
        final_lattice_hash: run.lattice().canonical_hash(),
    })
}

fn compact_centre(lattice: &Lattice<Life>, sweep: usize, max_extent: usize) -> Option<TrackPoint> {
    let (rows, cols) = observables::extent(lattice, Life::Alive)?;
    if rows >= max_extent || cols >= max_extent {
        return None;
    }
    let (row, col) = observables::centre_of_mass(lattice, Life::Alive)?;
    Some(TrackPoint { sweep, row, col })
}

fn unbroken_speed(points: &[TrackPoint], interval: usize) -> Option<f64> {
    let first = points.first()?;
    let last = points
        .windows(2)
        .take_while(|pair| pair[1].sweep - pair[0].sweep == interval)
        .last()
        .map(|pair| pair[1])?;
    let distance = (last.row - first.row).hypot(last.col - first.col);
    Some(distance / (last.sweep - first.sweep) as f64)
}

fn prepare<S, R>(
    size: usize,
    start: Option<Lattice<S>>,
    init: &InitialCondition<S>,
    rng: &mut R,
) -> Result<Lattice<S>, ToroidError>
where
    S: CellState,
    R: RandomSource + ?Sized,
{
    match start {
        Some(lattice) if lattice.size() == size => Ok(lattice),
        Some(lattice) => Err(ToroidError::Config(
            ErrorInfo::new("invalid-size", "starting lattice does not match the configured size")
                .with_context("size", size.to_string())
                .with_context("lattice", lattice.size().to_string()),
        )),
        None => Lattice::new(size, init, rng),
    }
}
