use crate::{cli::actions::Action, collectors::config::ScrapeConfig, exporter};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use std::time::Duration;
use tracing::info;

pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .ok_or_else(|| anyhow!("Port is required. Please provide it using the --port flag."))?;

    // None means auto-detect
    let listen = matches.get_one::<String>("listen").map(ToString::to_string);

    let metrics_path = matches
        .get_one::<String>("metrics-path")
        .map(ToString::to_string)
        .ok_or_else(|| {
            anyhow!("Metrics path is required. Please provide it using the --metrics-path flag.")
        })?;

    exporter::validate_metrics_path(&metrics_path)?;

    let endpoint = matches
        .get_one::<String>("v2ray-endpoint")
        .ok_or_else(|| {
            anyhow!("V2Ray endpoint is required. Please provide it using the --v2ray-endpoint flag.")
        })?;

    let timeout = matches
        .get_one::<u64>("scrape-timeout")
        .copied()
        .ok_or_else(|| {
            anyhow!("Scrape timeout is required. Please provide it using the --scrape-timeout flag.")
        })?;

    let config = ScrapeConfig::new(endpoint, Duration::from_secs(timeout))
        .with_context(|| format!("Invalid V2Ray endpoint '{endpoint}'"))?;

    info!(
        endpoint = %config.endpoint,
        timeout_secs = timeout,
        metrics_path = %metrics_path,
        "configuration loaded"
    );

    Ok(Action::Run {
        port,
        listen,
        metrics_path,
        config,
    })
}
