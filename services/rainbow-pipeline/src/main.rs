//! Rainbow forecast pipeline.
//!
//! Invoked periodically by an external scheduler:
//! - `run` processes every pending forecast and notifies matched cities
//! - `analyze` regenerates the analysis artifacts for given forecasts
//! - `forecasts` lists forecast directories and their state
//! - `load-cities` imports reference data into the gazetteer
//! - `closest` looks up the cities nearest a point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use gazetteer::{load_city_json, load_world_csv, Gazetteer, DEFAULT_MIN_POPULATION};
use projection::ForecastGridProjection;
use rainbow_common::ForecastSlug;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rainbow_pipeline::{
    analyze_only, forecast_listing, ConfigOverrides, HttpPushTransport, LogTransport, Notifier,
    Pipeline, PipelineConfig, PushTransport,
};

#[derive(Parser, Debug)]
#[command(name = "rainbow-pipeline")]
#[command(about = "Rainbow forecasts from GFS precipitable water")]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "RAINBOW_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log format (json or text)
    #[arg(long, default_value = "json", global = true)]
    log_format: String,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process pending forecasts
    Run,

    /// Regenerate analysis artifacts without matching or notifying
    Analyze {
        /// Forecast slugs (YYYYMMDDHH)
        #[arg(required = true)]
        slugs: Vec<ForecastSlug>,
    },

    /// List forecasts newest first
    Forecasts,

    /// Import cities into the gazetteer
    LoadCities {
        /// World cities CSV without header
        #[arg(long)]
        world: Option<PathBuf>,

        /// Smallest population imported from the world CSV
        #[arg(long, default_value_t = DEFAULT_MIN_POPULATION)]
        min_population: u64,

        /// JSON list of {lat, lon, name_ru, name_en}
        #[arg(long, requires = "country")]
        json: Option<PathBuf>,

        /// Country code for the JSON list
        #[arg(long)]
        country: Option<String>,
    },

    /// Cities nearest a point
    Closest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, default_value = "5")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    if args.log_format.eq_ignore_ascii_case("text") {
        tracing::subscriber::set_global_default(builder.finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }

    let config = PipelineConfig::resolve(args.config.as_deref(), &args.overrides)?;

    match args.command {
        Command::Run => run(config).await,
        Command::Analyze { slugs } => {
            let reports = analyze_only(&config, &config.toolset(), &slugs).await?;
            for report in reports {
                println!(
                    "{}\t{} cloud\t{} eligible\t{} favourable\t{}",
                    report.slug,
                    report.cloud_cells,
                    report.eligible_cells,
                    report.favourable_cells,
                    report.final_mask.display()
                );
            }
            Ok(())
        }
        Command::Forecasts => {
            let listing = forecast_listing(&config.data_dir, chrono::Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
        Command::LoadCities {
            world,
            min_population,
            json,
            country,
        } => load_cities(&config, world, min_population, json, country).await,
        Command::Closest { lat, lon, limit } => {
            let gazetteer = Gazetteer::open(&config.gazetteer_path).await?;
            for city in gazetteer.closest(lat, lon, limit).await? {
                println!(
                    "{}\t{}\t{}\t{:.1} km",
                    city.country,
                    city.name_en,
                    city.key,
                    city.distance_km(lat, lon)
                );
            }
            Ok(())
        }
    }
}

async fn run(config: PipelineConfig) -> Result<()> {
    info!(
        data_dir = %config.data_dir.display(),
        backend = ?config.distortion_backend,
        "Starting rainbow pipeline run"
    );

    let gazetteer = Gazetteer::open(&config.gazetteer_path).await?;

    let transport: Arc<dyn PushTransport> = match &config.push_endpoint {
        Some(endpoint) => Arc::new(HttpPushTransport::new(
            endpoint.clone(),
            config.push_api_key.clone(),
        )?),
        None => {
            info!("No push endpoint configured, notifications are only logged");
            Arc::new(LogTransport)
        }
    };
    let notifier = Notifier::new(transport, config.push_concurrency);

    let tools = config.toolset();
    let pipeline = Pipeline::new(config, tools, gazetteer, notifier);
    let report = pipeline.run().await?;

    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        "Pipeline run complete"
    );
    Ok(())
}

async fn load_cities(
    config: &PipelineConfig,
    world: Option<PathBuf>,
    min_population: u64,
    json: Option<PathBuf>,
    country: Option<String>,
) -> Result<()> {
    if world.is_none() && json.is_none() {
        bail!("nothing to import: pass --world and/or --json");
    }

    let projection = ForecastGridProjection::default();
    let gazetteer = Gazetteer::open(&config.gazetteer_path).await?;

    if let Some(path) = world {
        let cities = load_world_csv(&path, min_population, &projection)?;
        let inserted = gazetteer.insert_many(&cities).await?;
        info!(path = %path.display(), read = cities.len(), inserted, "Loaded world cities");
    }

    if let (Some(path), Some(country)) = (json, country) {
        let cities = load_city_json(&path, &country, &projection)?;
        let inserted = gazetteer.insert_many(&cities).await?;
        info!(path = %path.display(), country = %country, read = cities.len(), inserted, "Loaded cities");
    }

    info!(total = gazetteer.count().await?, "Gazetteer ready");
    Ok(())
}
