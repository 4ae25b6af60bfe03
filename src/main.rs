//! Sensor Telemetry CLI
//!
//! Serves the sensor query API, or runs single queries against a dataset file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sensor_telemetry::{
    config::Config,
    core::{parse_timestamp, AnomalyQuery, DataQuery, Density, QueryOptions, TimeRange},
    Dataset, InMemoryRepository, TelemetryService, VERSION,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sensor-telemetry")]
#[command(version = VERSION)]
#[command(about = "Gradient, window and anomaly queries over building sensor data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP query server
    Serve {
        /// Address to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(long)]
        port: Option<u16>,

        /// JSON dataset to load (overrides configuration)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Print a sensor's samples as JSON
    Data {
        /// JSON dataset file
        dataset: PathBuf,

        /// Sensor id
        sensor: String,

        /// Window start, "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        start: Option<String>,

        /// Window end, "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        end: Option<String>,

        /// Maximum number of samples before thinning
        #[arg(long)]
        limit: Option<usize>,

        /// Keep every n-th sample (1-16)
        #[arg(long, default_value = "1")]
        density: u32,
    },

    /// Print a sensor's anomaly intervals as JSON
    Anomalies {
        /// JSON dataset file
        dataset: PathBuf,

        /// Sensor id
        sensor: String,

        /// Window start, "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        start: Option<String>,

        /// Window end, "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        end: Option<String>,
    },

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            dataset,
        } => cmd_serve(host, port, dataset),
        Commands::Data {
            dataset,
            sensor,
            start,
            end,
            limit,
            density,
        } => cmd_data(&dataset, &sensor, start, end, limit, density),
        Commands::Anomalies {
            dataset,
            sensor,
            start,
            end,
        } => cmd_anomalies(&dataset, &sensor, start, end),
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(feature = "server")]
fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    dataset: Option<PathBuf>,
) -> anyhow::Result<()> {
    use sensor_telemetry::server::{self, ServerConfig};
    use std::sync::Arc;

    let mut config = Config::load().context("loading configuration")?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if dataset.is_some() {
        config.dataset_path = dataset;
    }

    let repository = match &config.dataset_path {
        Some(path) => load_repository(path)?,
        None => {
            tracing::warn!("No dataset configured, starting with an empty store");
            InMemoryRepository::new()
        }
    };

    println!("Sensor Telemetry v{VERSION}");
    println!("  Sensors loaded: {}", repository.sensor_count());
    println!("  End bound: {:?}", config.end_bound);
    println!("  Default limit: {}", config.default_limit);
    println!();
    println!("Press Ctrl+C to stop");

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async {
        let (addr, shutdown) =
            server::run(ServerConfig::from_config(&config), Arc::new(repository)).await?;
        println!("Listening on http://{addr}");

        tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl+C")?;
        let _ = shutdown.send(());
        println!();
        println!("Stopping server...");
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(not(feature = "server"))]
fn cmd_serve(
    _host: Option<String>,
    _port: Option<u16>,
    _dataset: Option<PathBuf>,
) -> anyhow::Result<()> {
    anyhow::bail!("the server feature is not enabled in this build")
}

fn cmd_data(
    dataset: &Path,
    sensor: &str,
    start: Option<String>,
    end: Option<String>,
    limit: Option<usize>,
    density: u32,
) -> anyhow::Result<()> {
    let options = Config::load()
        .context("loading configuration")?
        .query_options();
    let service = TelemetryService::new(load_repository(dataset)?);

    if limit == Some(0) {
        anyhow::bail!("--limit must be a positive integer");
    }
    let query = DataQuery {
        range: parse_range(start.as_deref(), end.as_deref(), &options)?,
        limit: limit.unwrap_or(options.default_limit),
        density: Density::new(density)?,
    };

    print_json(&service.query_data(sensor, &query)?)
}

fn cmd_anomalies(
    dataset: &Path,
    sensor: &str,
    start: Option<String>,
    end: Option<String>,
) -> anyhow::Result<()> {
    let options = Config::load()
        .context("loading configuration")?
        .query_options();
    let service = TelemetryService::new(load_repository(dataset)?);

    let query = AnomalyQuery {
        range: parse_range(start.as_deref(), end.as_deref(), &options)?,
    };

    print_json(&service.query_anomalies(sensor, &query)?)
}

fn cmd_config(init: bool) -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    if init {
        config.save().context("saving configuration")?;
        tracing::info!(path = ?Config::config_path(), "configuration written");
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn load_repository(path: &Path) -> anyhow::Result<InMemoryRepository> {
    let dataset = Dataset::load(path)?;
    tracing::info!(
        path = %path.display(),
        sensors = dataset.sensors.len(),
        samples = dataset.sample_count(),
        "dataset loaded"
    );
    Ok(InMemoryRepository::from_dataset(dataset)?)
}

fn parse_range(
    start: Option<&str>,
    end: Option<&str>,
    options: &QueryOptions,
) -> anyhow::Result<TimeRange> {
    let start = start.map(|raw| parse_timestamp("start", raw)).transpose()?;
    let end = end.map(|raw| parse_timestamp("end", raw)).transpose()?;
    Ok(TimeRange::new(start, end).with_end_bound(options.end_bound))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
