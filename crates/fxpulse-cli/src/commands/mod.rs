mod compute;
mod config;
mod snapshot;
mod watch;

use fxpulse_core::{AppConfig, EngineConfig, InstrumentPair};
use tracing::{debug, info};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;

    match &cli.command {
        Command::Snapshot(args) => snapshot::run(args, &config, cli).await,
        Command::Compute(args) => compute::run(args, &config, cli),
        Command::Watch(args) => watch::run(args, &config, cli).await,
        Command::Config => config::run(&config, cli),
    }
}

/// File (or defaults), then flag and environment overrides, then validation.
fn load_config(cli: &Cli) -> Result<AppConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration file");
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.source.endpoint = endpoint.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.source.api_key = Some(api_key.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.scheduler.request_timeout_ms = timeout_ms;
    }

    config.validate()?;
    debug!(source = ?config.source, "configuration ready");
    Ok(config)
}

/// Narrow the engine to `pairs`. The composite is dropped when the narrowed
/// list no longer covers its basket.
fn engine_config(base: &EngineConfig, pairs: &[String]) -> Result<EngineConfig, CliError> {
    if pairs.is_empty() {
        return Ok(base.clone());
    }

    let pairs = pairs
        .iter()
        .map(|raw| InstrumentPair::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let composite = base.composite.clone().filter(|basket| {
        let covered = basket
            .components
            .iter()
            .all(|component| pairs.contains(&component.pair));
        if !covered {
            info!(basket = %basket.name, "composite index skipped for a partial pair list");
        }
        covered
    });

    let narrowed = EngineConfig {
        pairs,
        composite,
        ..base.clone()
    };
    narrowed.validate()?;
    Ok(narrowed)
}
