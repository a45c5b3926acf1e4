use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};

use oneweather::{Location, OneWeatherConfig, OneWeatherError, SourceManager, logging};

#[derive(Parser)]
#[command(version, about = "Blended multi-source weather forecast for a point", long_about = None)]
struct Cli {
    #[arg(long, allow_negative_numbers = true, help = "Latitude in decimal degrees (-90 to 90)")]
    lat: f64,

    #[arg(long, allow_negative_numbers = true, help = "Longitude in decimal degrees (-180 to 180)")]
    lon: f64,

    #[arg(
        long,
        default_value_t = 24,
        value_parser = clap::value_parser!(u16).range(1..=168),
        help = "Number of hourly points to print"
    )]
    hours: u16,

    #[arg(short, long, value_name = "PATH", help = "Configuration file (TOML)")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,

    #[arg(long, help = "Include per-source coverage details")]
    sources: bool,

    #[arg(long, help = "Print source status after fetching")]
    status: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        error!("{e:#}");
        let message = e
            .downcast_ref::<OneWeatherError>()
            .map_or_else(|| format!("{e:#}"), OneWeatherError::user_message);
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config =
        OneWeatherConfig::load_from_path(cli.config.clone()).context("Failed to load configuration")?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    logging::init(&config.logging)?;

    let location = Location::new(cli.lat, cli.lon).context("Invalid coordinates")?;
    debug!("Fetching forecast for {}", location.format_coordinates());

    let manager =
        SourceManager::from_config(&config.sources).context("Failed to register weather sources")?;
    let forecast = manager
        .forecast(location.latitude, location.longitude)
        .await
        .limit_hours(usize::from(cli.hours));

    let mut output = serde_json::to_value(&forecast)?;
    if !cli.sources {
        if let Some(fields) = output.as_object_mut() {
            fields.remove("source_details");
        }
    }
    println!("{}", serde_json::to_string_pretty(&output)?);

    if cli.status {
        let status = manager.status().await;
        println!("{}", serde_json::to_string_pretty(&status)?);
    }

    Ok(())
}
