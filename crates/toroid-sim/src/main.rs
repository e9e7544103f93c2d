use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use toroid_core::errors::ErrorInfo;
use toroid_core::ToroidError;
use tracing_subscriber::EnvFilter;

use commands::{
    ising::{self, IsingArgs},
    life::{self, GliderArgs},
    sirs,
};

mod commands;
mod sink;

#[derive(Parser, Debug)]
#[command(
    name = "toroid-sim",
    about = "Stochastic lattice simulations on a torus: Ising, SIRS and Game of Life"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ising temperature scan with bootstrap errors.
    Ising(IsingArgs),
    /// Single SIRS run with its infected-count trace.
    Sirs(RunArgs),
    /// Average infected fraction over the (p1, p3) plane.
    SirsPhase(RunArgs),
    /// Infected-site variance against p1.
    SirsInfection(RunArgs),
    /// Average infected fraction against the immune fraction.
    SirsImmunity(RunArgs),
    /// Equilibration times of Life from random grids.
    LifeEquilibrate(RunArgs),
    /// Centre-of-mass track and speed of a glider.
    Glider(GliderArgs),
}

/// Arguments shared by every subcommand.
#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// YAML configuration; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory for the table and summary.
    #[arg(long)]
    pub out: PathBuf,
    /// Overrides the configured master seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Command::Ising(args) => ising::run(&args)?,
        Command::Sirs(args) => sirs::run_single(&args)?,
        Command::SirsPhase(args) => sirs::run_phase(&args)?,
        Command::SirsInfection(args) => sirs::run_infection(&args)?,
        Command::SirsImmunity(args) => sirs::run_immunity(&args)?,
        Command::LifeEquilibrate(args) => life::run_equilibrate(&args)?,
        Command::Glider(args) => life::run_glider(&args)?,
    }
    Ok(())
}

/// Loads the YAML config at `path`, or the defaults when no path is given.
pub fn load_config<T>(path: Option<&Path>) -> Result<T, ToroidError>
where
    T: DeserializeOwned + Default,
{
    match path {
        Some(path) => toroid_mcmc::config::load(path),
        None => Ok(T::default()),
    }
}

/// Records the effective configuration next to the results.
pub fn write_config<T: Serialize>(out_dir: &Path, config: &T) -> Result<(), ToroidError> {
    let path = out_dir.join("config.yaml");
    let config_error = |message: String| {
        ToroidError::Io(
            ErrorInfo::new("summary-write", message)
                .with_context("path", path.display().to_string()),
        )
    };
    fs::create_dir_all(out_dir).map_err(|err| config_error(err.to_string()))?;
    let yaml = serde_yaml::to_string(config).map_err(|err| config_error(err.to_string()))?;
    fs::write(&path, yaml).map_err(|err| config_error(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toroid_mcmc::SirsConfig;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "toroid-sim",
            "-v",
            "sirs-immunity",
            "--out",
            "results",
            "--seed",
            "9",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::SirsImmunity(args) => {
                assert_eq!(args.out, PathBuf::from("results"));
                assert_eq!(args.seed, Some(9));
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn out_directory_is_required() {
        assert!(Cli::try_parse_from(["toroid-sim", "life-equilibrate"]).is_err());
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let config: SirsConfig = load_config(None).unwrap();
        assert_eq!(config, SirsConfig::default());
    }

    #[test]
    fn config_round_trips_through_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = SirsConfig {
            p1: 0.8,
            ..SirsConfig::default()
        };
        write_config(dir.path(), &config).unwrap();
        let loaded: SirsConfig = load_config(Some(&dir.path().join("config.yaml"))).unwrap();
        assert_eq!(loaded, config);
    }
}
