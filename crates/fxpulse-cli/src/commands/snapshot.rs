use fxpulse_core::{fetch_snapshot, AppConfig, FormatCache, HttpQuoteSource, SnapshotEngine};
use tracing::info;

use crate::cli::{Cli, SnapshotArgs};
use crate::error::CliError;
use crate::output::{self, Board};

use super::engine_config;

pub async fn run(args: &SnapshotArgs, config: &AppConfig, cli: &Cli) -> Result<(), CliError> {
    let engine = SnapshotEngine::new(engine_config(&config.engine, &args.pairs)?)?;
    let source =
        HttpQuoteSource::new(&config.source).with_timeout_ms(config.scheduler.request_timeout_ms);

    info!(pairs = engine.config().pairs.len(), "fetching snapshot");
    let built = fetch_snapshot(&engine, &source, config.scheduler.request_timeout()).await?;

    let mut formats = FormatCache::from_config(engine.config());
    output::print(&Board::from_built(&built), cli.format, cli.pretty, &mut formats)
}
