use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "flightcheck",
    version,
    about = "Go/no-go flight conditions check for small drones"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file (default: $CONFIG_DIR/flightcheck/config.toml)")]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate current conditions at a location
    Check {
        #[arg(long, allow_negative_numbers = true, requires = "lon", help = "Latitude in decimal degrees")]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat", help = "Longitude in decimal degrees")]
        lon: Option<f64>,
        #[arg(long, default_value_t = false, help = "Report darkness as CAUTION instead of NO-FLY")]
        allow_night_flight: bool,
    },
    /// Print the effective configuration
    Config,
}
