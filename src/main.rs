use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, warn};

use flightcheck::config::FlightCheckConfig;
use flightcheck::logging::init_logging;
use flightcheck::report::{self, JsonOut};
use flightcheck::{FlightCheckError, LiveFlightCheck, Location};

mod cli;

use cli::{Cli, Commands};

/// Exit status when no verdict could be produced
const EXIT_CANNOT_EVALUATE: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = FlightCheckConfig::load_from_path(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose)?;
    debug!("Configuration loaded");

    match &cli.command {
        Commands::Check {
            lat,
            lon,
            allow_night_flight,
        } => check(cli, &config, (*lat).zip(*lon), *allow_night_flight),
        Commands::Config => show_config(cli, &config),
    }
}

fn check(
    cli: &Cli,
    config: &FlightCheckConfig,
    coordinates: Option<(f64, f64)>,
    allow_night_flight: bool,
) -> Result<ExitCode> {
    let tz = config.timezone()?;
    let flight_check = LiveFlightCheck::from_config(config, allow_night_flight)
        .with_context(|| "Failed to set up data providers")?;

    let result = resolve_location(config, coordinates)
        .and_then(|location| flight_check.run(location, Utc::now()));

    match result {
        Ok(flight_report) => {
            if cli.json {
                println!("{}", report::render_json(&flight_report)?);
            } else {
                println!("{}", report::render_text(&flight_report, tz));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_cannot_evaluate() => {
            warn!("Cannot evaluate: {}", e);
            if cli.json {
                println!("{}", report::render_error_json(&e)?);
            } else {
                println!("{}", report::render_cannot_evaluate(&e));
            }
            Ok(ExitCode::from(EXIT_CANNOT_EVALUATE))
        }
        Err(e) => Err(e.into()),
    }
}

fn resolve_location(
    config: &FlightCheckConfig,
    coordinates: Option<(f64, f64)>,
) -> flightcheck::Result<Location> {
    match (coordinates, config.location) {
        (Some((latitude, longitude)), _) => Location::new(latitude, longitude),
        (None, Some(location)) => Ok(location),
        (None, None) => Err(FlightCheckError::invalid_input(
            "no location given: pass --lat and --lon or set [location] in the config file",
        )),
    }
}

fn show_config(cli: &Cli, config: &FlightCheckConfig) -> Result<ExitCode> {
    let path = FlightCheckConfig::resolve_path(cli.config.as_deref());
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: true,
                data: Some(config),
                error: None,
            })?
        );
    } else {
        let status = if path.exists() {
            "loaded"
        } else {
            "not found, using defaults"
        };
        println!("# {} ({})", path.display(), status);
        println!("{}", config.to_toml()?);
    }
    Ok(ExitCode::SUCCESS)
}
