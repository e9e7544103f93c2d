use std::time::Instant;

use rayon::prelude::*;
use toroid_core::{Lattice, Spin, ToroidError};

use crate::config::{
    EquilibrationTrials, ImmunityScan, InfectionScan, IsingConfig, PhasePlaneScan, SirsConfig,
    TemperatureScan,
};
use crate::determinism::job_seed;
use crate::driver::{self, EquilibrationReport, IsingSummary, SirsSummary};

/// Runs every job on the rayon pool and returns the results in job order.
///
/// Job `i` is seeded with `job_seed(master_seed, i)`, so the output does not
/// depend on the number of worker threads.
fn fan_out<J, T, F>(jobs: &[J], master_seed: u64, run: F) -> Result<Vec<T>, ToroidError>
where
    J: Sync,
    T: Send,
    F: Fn(&J, u64) -> Result<T, ToroidError> + Sync,
{
    jobs.par_iter()
        .enumerate()
        .map(|(index, job)| {
            let started = Instant::now();
            let result = run(job, job_seed(master_seed, index));
            tracing::debug!(
                job = index,
                of = jobs.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scan job finished"
            );
            result
        })
        .collect()
}

/// Ising runs across a temperature range.
///
/// With `anneal` set the temperatures run in order and each starts from the
/// previous final lattice; otherwise every temperature is an independent job.
pub fn temperature_scan(scan: &TemperatureScan) -> Result<Vec<IsingSummary>, ToroidError> {
    scan.temperatures.validate()?;
    let master_seed = scan.base.seed_policy.master_seed;
    let configs: Vec<IsingConfig> = scan
        .temperatures
        .values()
        .into_iter()
        .map(|temperature| IsingConfig {
            temperature,
            ..scan.base.clone()
        })
        .collect();
    tracing::info!(
        points = configs.len(),
        anneal = scan.anneal,
        dynamics = scan.base.dynamics.as_str(),
        "temperature scan"
    );
    if !scan.anneal {
        return fan_out(&configs, master_seed, |config, seed| {
            driver::run_ising(config, seed).map(|outcome| outcome.summary)
        });
    }
    let mut lattice: Option<Lattice<Spin>> = None;
    let mut summaries = Vec::with_capacity(configs.len());
    for (index, config) in configs.iter().enumerate() {
        let outcome =
            driver::run_ising_with(config, lattice.take(), job_seed(master_seed, index), |_, _| {})?;
        tracing::debug!(
            temperature = config.temperature,
            abs_magnetization = outcome.summary.abs_magnetization,
            "annealing step finished"
        );
        summaries.push(outcome.summary);
        lattice = Some(outcome.lattice);
    }
    Ok(summaries)
}

/// Average infected fraction over the `(p1, p3)` grid, `p3` varying slowest.
pub fn phase_plane(scan: &PhasePlaneScan) -> Result<Vec<SirsSummary>, ToroidError> {
    scan.p1.validate()?;
    scan.p3.validate()?;
    let p1_values = scan.p1.values();
    let p1_values = &p1_values;
    let configs: Vec<SirsConfig> = scan
        .p3
        .values()
        .into_iter()
        .flat_map(move |p3| {
            p1_values.iter().map(move |&p1| SirsConfig {
                p1,
                p3,
                ..scan.base.clone()
            })
        })
        .collect();
    tracing::info!(points = configs.len(), p2 = scan.base.p2, "phase plane scan");
    run_sirs_jobs(&configs, scan.base.seed_policy.master_seed)
}

/// Infected-count variance with bootstrap errors along `p1`.
pub fn infection_scan(scan: &InfectionScan) -> Result<Vec<SirsSummary>, ToroidError> {
    scan.p1.validate()?;
    let configs: Vec<SirsConfig> = scan
        .p1
        .values()
        .into_iter()
        .map(|p1| SirsConfig {
            p1,
            ..scan.base.clone()
        })
        .collect();
    tracing::info!(points = configs.len(), "infection scan");
    run_sirs_jobs(&configs, scan.base.seed_policy.master_seed)
}

/// Average infected fraction against the immune fraction.
pub fn immunity_scan(scan: &ImmunityScan) -> Result<Vec<SirsSummary>, ToroidError> {
    scan.fractions.validate()?;
    let configs: Vec<SirsConfig> = scan
        .fractions
        .values()
        .into_iter()
        .map(|immunity_fraction| SirsConfig {
            immunity_fraction,
            ..scan.base.clone()
        })
        .collect();
    tracing::info!(points = configs.len(), "immunity scan");
    run_sirs_jobs(&configs, scan.base.seed_policy.master_seed)
}

/// Independent Life equilibration searches from fresh random grids.
pub fn equilibration_trials(
    trials: &EquilibrationTrials,
) -> Result<Vec<EquilibrationReport>, ToroidError> {
    trials.base.validate()?;
    let jobs: Vec<usize> = (0..trials.trials).collect();
    tracing::info!(trials = trials.trials, size = trials.base.size, "equilibration trials");
    fan_out(&jobs, trials.base.seed_policy.master_seed, |_, seed| {
        driver::run_life_equilibration(&trials.base, seed).map(|outcome| outcome.summary)
    })
}

fn run_sirs_jobs(configs: &[SirsConfig], master_seed: u64) -> Result<Vec<SirsSummary>, ToroidError> {
    fan_out(configs, master_seed, |config, seed| {
        driver::run_sirs(config, seed).map(|outcome| outcome.summary)
    })
}
