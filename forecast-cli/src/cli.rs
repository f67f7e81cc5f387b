use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use forecast_core::{Config, Coordinate};
use std::process::ExitCode;

use crate::{configure, show};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast for where you are")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current conditions, the next hours and the next days.
    Show(ShowArgs),

    /// Interactively set the permission policy, fixed position and API endpoint.
    Configure,

    /// Print the path of the config file.
    ConfigPath,
}

#[derive(Debug, Default, Args)]
pub struct ShowArgs {
    /// Grant location access without asking.
    #[arg(long, conflicts_with = "deny_location")]
    pub allow_location: bool,

    /// Refuse location access; the default location is used.
    #[arg(long)]
    pub deny_location: bool,

    /// Device latitude to report instead of looking it up.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Device longitude to report instead of looking it up.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Print the loaded forecast as JSON instead of the screen.
    #[arg(long)]
    pub json: bool,
}

impl ShowArgs {
    /// Position given on the command line, range-checked.
    pub fn position(&self) -> anyhow::Result<Option<Coordinate>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => validate_position(Coordinate::new(lat, lon)).map(Some),
            _ => Ok(None),
        }
    }
}

pub fn validate_position(position: Coordinate) -> anyhow::Result<Coordinate> {
    if !(-90.0..=90.0).contains(&position.latitude) {
        bail!("Latitude {} is out of range (-90..=90)", position.latitude);
    }
    if !(-180.0..=180.0).contains(&position.longitude) {
        bail!("Longitude {} is out of range (-180..=180)", position.longitude);
    }
    Ok(position)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Show(args) => {
                let config = Config::load()?;
                show::run(args, &config).await
            }
            Command::Configure => {
                let mut config = Config::load()?;
                configure::run(&mut config)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
