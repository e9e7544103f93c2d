use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use serde::Serialize;
use toroid_core::ToroidError;
use toroid_mcmc::scan::equilibration_trials;
use toroid_mcmc::{track_glider, EquilibrationTrials, GliderConfig};

use crate::sink::{optional, write_summary, TsvSink};
use crate::{load_config, write_config, RunArgs};

#[derive(Args, Debug)]
pub struct GliderArgs {
    /// YAML glider configuration; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory for the track and summary.
    #[arg(long)]
    pub out: PathBuf,
}

/// Aggregate over all equilibration trials.
#[derive(Debug, Serialize)]
struct TrialSummary {
    trials: usize,
    equilibrated: usize,
    not_found: usize,
    mean_time: Option<f64>,
}

pub fn run_equilibrate(args: &RunArgs) -> Result<(), ToroidError> {
    let mut trials: EquilibrationTrials = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        trials.base.seed_policy.master_seed = seed;
    }
    let started = Instant::now();
    let reports = equilibration_trials(&trials)?;

    let times: Vec<usize> = reports
        .iter()
        .filter_map(|report| report.equilibration.time())
        .collect();
    let mean_time = if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<usize>() as f64 / times.len() as f64)
    };
    let summary = TrialSummary {
        trials: reports.len(),
        equilibrated: times.len(),
        not_found: reports.len() - times.len(),
        mean_time,
    };
    tracing::info!(
        trials = summary.trials,
        not_found = summary.not_found,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "equilibration trials complete"
    );

    let path = args.out.join("life_equilibration.tsv");
    let mut sink = TsvSink::create(&path, &["trial", "equilibration_time"])?;
    for (trial, report) in reports.iter().enumerate() {
        sink.write_row(&[trial.to_string(), optional(report.equilibration.time())])?;
    }
    sink.finish()?;
    write_summary(&args.out.join("summary.json"), &summary)?;
    write_config(&args.out, &trials)
}

pub fn run_glider(args: &GliderArgs) -> Result<(), ToroidError> {
    let config: GliderConfig = load_config(args.config.as_deref())?;
    let track = track_glider(&config)?;
    match track.speed {
        Some(speed) => tracing::info!(points = track.points.len(), speed, "glider tracked"),
        None => tracing::warn!("glider never stayed compact long enough to measure a speed"),
    }

    let mut sink = TsvSink::create(&args.out.join("glider.tsv"), &["sweep", "row_com", "col_com"])?;
    for point in &track.points {
        sink.write_row(&[
            point.sweep.to_string(),
            point.row.to_string(),
            point.col.to_string(),
        ])?;
    }
    sink.finish()?;
    write_summary(&args.out.join("summary.json"), &track)?;
    write_config(&args.out, &config)
}
