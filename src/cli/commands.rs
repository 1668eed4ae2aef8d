use crate::cli::Commands;
use crate::collector::CollectorSet;
use crate::config::Config;
use crate::metrics::PrometheusExporter;
use crate::sysctl::KernelSource;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub async fn handle_command(command: Commands, config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    match command {
        Commands::Scrape {
            output,
            enable,
            disable,
        } => handle_scrape(&config, &enable, &disable, output.as_deref()).await,
        Commands::Watch { interval } => handle_watch(&config, interval).await,
        Commands::List => handle_list(&config),
    }
}

/// Build the collector set from the default table, then layer the config
/// file and the command-line overrides on top, in that order.
fn build_exporter(config: &Config, enable: &[String], disable: &[String]) -> Result<PrometheusExporter> {
    let source = Arc::new(KernelSource);
    let mut set = CollectorSet::with_defaults(source)?;

    config.apply(&mut set)?;
    for name in enable {
        set.set_enabled(name, true)?;
    }
    for name in disable {
        set.set_enabled(name, false)?;
    }

    Ok(PrometheusExporter::new(set))
}

async fn handle_scrape(
    config: &Config,
    enable: &[String],
    disable: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let exporter = build_exporter(config, enable, disable)?;
    let text = exporter.scrape().await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &text).await?;
            info!("wrote {} bytes to {}", text.len(), path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

async fn handle_watch(config: &Config, interval: Option<u64>) -> Result<()> {
    let exporter = build_exporter(config, &[], &[])?;
    let interval = interval
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.interval());
    exporter.run(interval).await
}

fn handle_list(config: &Config) -> Result<()> {
    let exporter = build_exporter(config, &[], &[])?;
    for (name, enabled) in exporter.collectors().statuses() {
        let state = if enabled { "enabled" } else { "disabled" };
        println!("{name}\t{state}");
    }
    Ok(())
}
