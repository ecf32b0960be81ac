use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use meter_analytics::analytics::{dynamic_price, find_peak_interval, hourly_profile};
use meter_analytics::config::Config;
use meter_analytics::domain::{MeterId, RegionMapping};
use meter_analytics::forecast::{ForecastEngine, Horizon};
use meter_analytics::ml::artifact::ModelArtifact;
use meter_analytics::preprocess::{self, RegionalConsumption};
use meter_analytics::repo::{
    load_region_mapping, load_series, MeterIndex, ReadingTable, RegionIndex, Repositories,
};
use meter_analytics::series::{delta, region_totals};
use meter_analytics::snapshot::SnapshotClassifier;
use meter_analytics::{telemetry, AnalyticsError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "meter-analytics")]
#[command(
    about = "Regional energy snapshots and consumption forecasts from smart meter readings",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to config/default.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the processed meter, region and country series files
    Preprocess,

    /// Consumption deltas between consecutive readings of one meter
    Deltas {
        #[arg(short, long)]
        meter: String,
    },

    /// Import and export series per region plus the country total
    Regions,

    /// Color-coded regional consumption at one instant
    Snapshot {
        /// Timestamp as DD.MM.YYYY HH:MM:SS
        #[arg(short, long)]
        time: String,
    },

    /// Forecast hourly consumption for a meter or region
    Forecast(ForecastArgs),

    /// Hourly import deltas of one meter over a day
    Profile {
        #[arg(short, long)]
        meter: String,

        /// Day as DD.MM.YYYY
        #[arg(short, long)]
        day: String,
    },

    /// Largest single-interval import of one meter over a day
    Peak {
        #[arg(short, long)]
        meter: String,

        /// Day as DD.MM.YYYY
        #[arg(short, long)]
        day: String,
    },

    /// Whole-period import per region
    Totals,

    /// Dynamic price estimate for an hour of the day
    Tariff {
        #[arg(long)]
        hour: f64,

        #[arg(long)]
        previous_cost: f64,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["meter", "region", "index"])))]
struct ForecastArgs {
    #[arg(short, long)]
    meter: Option<String>,

    #[arg(short, long)]
    region: Option<String>,

    /// Row of the processed meter series
    #[arg(short, long)]
    index: Option<usize>,

    /// Forecast a week instead of a day
    #[arg(short, long)]
    week: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    let result = run(&cfg, cli.command);
    if let Err(e) = &result {
        if let Some(analytics) = e.downcast_ref::<AnalyticsError>() {
            error!(kind = analytics.kind(), error = %analytics, "command failed");
        }
    }
    result
}

fn run(cfg: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Preprocess => {
            let table = load_readings(cfg)?;
            let mapping = load_mapping(cfg)?;
            let processed = preprocess::run(&table, &mapping, &cfg.data)?;
            info!(
                meters = processed.meters.len(),
                regions = processed.regions.len(),
                "preprocessing done"
            );
        }
        Commands::Deltas { meter } => {
            let table = load_readings(cfg)?;
            let meter = MeterId::from(meter);
            let readings = table
                .readings(&meter)
                .ok_or_else(|| AnalyticsError::Validation(format!("unknown meter id '{meter}'")))?;
            print_json(&delta::compute(readings)?)?;
        }
        Commands::Regions => {
            let table = load_readings(cfg)?;
            let mapping = load_mapping(cfg)?;
            print_json(&RegionalConsumption::build(&table, &mapping)?)?;
        }
        Commands::Snapshot { time } => {
            let repos = Repositories::load(&cfg.data).context("loading source data")?;
            let snapshot =
                SnapshotClassifier::new(&repos.readings, &repos.regions, &repos.coordinates)
                    .with_window(chrono::Duration::minutes(cfg.snapshot.window_minutes))
                    .classify(&time)?;
            print_json(&snapshot)?;
        }
        Commands::Forecast(args) => {
            let values = forecast(cfg, args)?;
            print_json(&values)?;
        }
        Commands::Profile { meter, day } => {
            let table = load_readings(cfg)?;
            print_json(&hourly_profile(&table, &MeterId::from(meter), &day)?)?;
        }
        Commands::Peak { meter, day } => {
            let table = load_readings(cfg)?;
            print_json(&find_peak_interval(&table, &MeterId::from(meter), &day)?)?;
        }
        Commands::Totals => {
            let table = load_readings(cfg)?;
            let mapping = load_mapping(cfg)?;
            print_json(&region_totals(&table, &mapping)?)?;
        }
        Commands::Tariff { hour, previous_cost } => {
            print_json(&dynamic_price(hour, previous_cost)?)?;
        }
    }
    Ok(())
}

fn load_readings(cfg: &Config) -> Result<ReadingTable> {
    ReadingTable::load(&cfg.data.readings_path).context("loading readings")
}

fn load_mapping(cfg: &Config) -> Result<RegionMapping> {
    load_region_mapping(&cfg.data.region_map_path).context("loading region map")
}

fn forecast(cfg: &Config, args: ForecastArgs) -> Result<Vec<f64>> {
    let artifact =
        ModelArtifact::load(&cfg.model.artifact_path).context("loading model artifact")?;
    let (model, scalers) = artifact.into_parts()?;
    let engine = ForecastEngine::new(Arc::new(model), scalers, cfg.forecast.clone());
    let horizon = if args.week { Horizon::Week } else { Horizon::Day };

    if let Some(region) = args.region {
        let index = RegionIndex::load(&cfg.data.region_index_path)
            .context("loading region index")?
            .position(&region)?;
        let data = load_series(&cfg.data.region_series_path).context("loading region series")?;
        return Ok(engine.forecast_region(&data, index, horizon)?);
    }

    let index = match (args.meter, args.index) {
        (Some(meter), _) => MeterIndex::load(&cfg.data.meter_index_path)
            .context("loading meter index")?
            .position(&MeterId::from(meter))?,
        (None, Some(index)) => index,
        (None, None) => anyhow::bail!("one of --meter, --region or --index is required"),
    };
    let data = load_series(&cfg.data.meter_series_path).context("loading meter series")?;
    Ok(engine.forecast_registered(&data, index, horizon)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
