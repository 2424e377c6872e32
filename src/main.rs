//! Monitor entry point: CLI wiring, config loading, and the driver lifecycle.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use electrack::cli::{Cli, Command, ExportArgs};
use electrack::config::{MonitorConfig, StorageBackend};
use electrack::dashboard::Dashboard;
use electrack::driver::Drivers;
use electrack::history::{DEFAULT_DAYS_BACK, DEFAULT_HOURS_BACK};
use electrack::io::export::{export_chart_csv, export_history_csv};
use electrack::notify::TracingNotifier;
use electrack::storage::rate::parse_rate_input;
use electrack::storage::{FileStore, KeyValueStore, MemoryStore, RateStore};

type Store = Arc<dyn KeyValueStore>;

fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    // --config takes priority, then --preset, then the household default
    let mut config = if let Some(path) = &cli.source.config {
        MonitorConfig::from_toml_file(path)?
    } else if let Some(name) = &cli.source.preset {
        MonitorConfig::from_preset(name)?
    } else {
        MonitorConfig::household()
    };

    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid configuration ({} errors)", errors.len());
    }
    Ok(config)
}

fn open_store(config: &MonitorConfig) -> Result<Store> {
    Ok(match config.storage.backend {
        StorageBackend::File => {
            let store = FileStore::open(&config.storage.data_dir).with_context(|| {
                format!("cannot open {}", config.storage.data_dir.display())
            })?;
            info!(dir = %store.dir().display(), "Using file storage");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, nothing will be persisted");
            Arc::new(MemoryStore::new())
        }
    })
}

async fn run(config: &MonitorConfig, store: Store) -> Result<()> {
    let dashboard = Arc::new(Mutex::new(Dashboard::new(config, store, TracingNotifier)));
    let drivers = Drivers::spawn(&dashboard, &config.monitor);

    info!("Monitoring, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    drivers.stop().await;

    let dashboard = dashboard.lock();
    for device in dashboard.devices().iter() {
        println!("{device}");
    }
    println!("\n{}", dashboard.summary());
    Ok(())
}

fn rate(config: &MonitorConfig, store: Store, value: Option<&str>) -> Result<()> {
    let mut rates = RateStore::load_or(store, config.monitor.default_rate_per_kwh);
    if let Some(input) = value {
        let rate = parse_rate_input(input)?;
        rates.set_rate(rate);
        println!("Energy rate set to ${rate:.2}/kWh");
    } else {
        println!("${:.2}/kWh", rates.rate());
    }
    Ok(())
}

fn export(config: &MonitorConfig, store: Store, args: &ExportArgs) -> Result<()> {
    let dashboard = Dashboard::new(config, store, TracingNotifier);
    let now = Utc::now().timestamp_millis();

    let written = if args.raw {
        export_history_csv(dashboard.history().snapshots(), &args.out)
    } else if args.daily {
        let points = dashboard.daily(args.range.unwrap_or(DEFAULT_DAYS_BACK), now);
        export_chart_csv(&points, &args.out)
    } else {
        let points = dashboard.hourly(args.range.unwrap_or(DEFAULT_HOURS_BACK), now);
        export_chart_csv(&points, &args.out)
    };
    written.with_context(|| format!("failed to write {}", args.out.display()))?;

    eprintln!("History written to {}", args.out.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let store = open_store(&config)?;

    match cli.command() {
        Command::Run => run(&config, store).await,
        Command::Rate { value } => rate(&config, store, value.as_deref()),
        Command::Export(args) => export(&config, store, args),
    }
}
