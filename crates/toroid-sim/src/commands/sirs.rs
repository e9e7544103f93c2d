use std::time::Instant;

use serde::Serialize;
use toroid_core::{Epidemic, Lattice, ToroidError};
use toroid_mcmc::driver::run_sirs_with;
use toroid_mcmc::scan::{immunity_scan, infection_scan, phase_plane};
use toroid_mcmc::{ImmunityScan, InfectionScan, PhasePlaneScan, SirsConfig, SirsSummary};

use crate::sink::{write_summary, TsvSink};
use crate::{load_config, write_config, RunArgs};

const PROGRESS_EVERY: usize = 1000;

pub fn run_single(args: &RunArgs) -> Result<(), ToroidError> {
    let mut config: SirsConfig = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }
    let started = Instant::now();
    let mut trace = Vec::with_capacity(config.sampling.sweeps);
    let outcome = run_sirs_with(
        &config,
        config.seed_policy.master_seed,
        |sweep, lattice: &Lattice<Epidemic>| {
            trace.push(lattice.count(Epidemic::Infected));
            if (sweep + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(
                    sweep = sweep + 1,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "sirs progress"
                );
            }
        },
    )?;

    let mut sink = TsvSink::create(&args.out.join("sirs_trace.tsv"), &["sweep", "infected"])?;
    for (sweep, infected) in trace.iter().enumerate() {
        sink.write_row(&[sweep.to_string(), infected.to_string()])?;
    }
    sink.finish()?;
    write_summary(&args.out.join("summary.json"), &outcome.summary)?;
    write_config(&args.out, &config)
}

pub fn run_phase(args: &RunArgs) -> Result<(), ToroidError> {
    let mut scan: PhasePlaneScan = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        scan.base.seed_policy.master_seed = seed;
    }
    let summaries = timed("phase plane", || phase_plane(&scan))?;
    write_table(args, "sirs_phase.tsv", &["p1", "p3", "infected_fraction"], &summaries, |s| {
        vec![s.p1.to_string(), s.p3.to_string(), s.infected_fraction.to_string()]
    })?;
    write_config(&args.out, &scan)
}

pub fn run_infection(args: &RunArgs) -> Result<(), ToroidError> {
    let mut scan: InfectionScan = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        scan.base.seed_policy.master_seed = seed;
    }
    let summaries = timed("infection scan", || infection_scan(&scan))?;
    write_table(
        args,
        "sirs_variance.tsv",
        &["p1", "variance", "variance_error"],
        &summaries,
        |s| {
            vec![
                s.p1.to_string(),
                s.infected_variance.to_string(),
                s.infected_variance_error.to_string(),
            ]
        },
    )?;
    write_config(&args.out, &scan)
}

pub fn run_immunity(args: &RunArgs) -> Result<(), ToroidError> {
    let mut scan: ImmunityScan = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        scan.base.seed_policy.master_seed = seed;
    }
    let summaries = timed("immunity scan", || immunity_scan(&scan))?;
    write_table(
        args,
        "sirs_immunity.tsv",
        &["immunity_fraction", "infected_fraction"],
        &summaries,
        |s| {
            vec![
                s.immunity_fraction.to_string(),
                s.infected_fraction.to_string(),
            ]
        },
    )?;
    write_config(&args.out, &scan)
}

fn timed<T>(
    name: &str,
    scan: impl FnOnce() -> Result<Vec<T>, ToroidError>,
) -> Result<Vec<T>, ToroidError> {
    let started = Instant::now();
    let results = scan()?;
    tracing::info!(
        scan = name,
        points = results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan complete"
    );
    Ok(results)
}

fn write_table<F>(
    args: &RunArgs,
    file: &str,
    header: &[&str],
    summaries: &[SirsSummary],
    row: F,
) -> Result<(), ToroidError>
where
    F: Fn(&SirsSummary) -> Vec<String>,
{
    let mut sink = TsvSink::create(&args.out.join(file), header)?;
    for summary in summaries {
        sink.write_row(&row(summary))?;
    }
    sink.finish()?;
    write_summary(&args.out.join("summary.json"), &ScanSummary { points: summaries })
}

#[derive(Serialize)]
struct ScanSummary<'a> {
    points: &'a [SirsSummary],
}
