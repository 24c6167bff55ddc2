use std::sync::Arc;

use fxpulse_core::{
    AppConfig, CircuitBreaker, FormatCache, HttpQuoteSource, QuoteSource, RefreshScheduler,
    SnapshotEngine,
};
use tracing::info;

use crate::cli::{Cli, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Board};

use super::engine_config;

pub async fn run(args: &WatchArgs, config: &AppConfig, cli: &Cli) -> Result<(), CliError> {
    let mut scheduler_config = config.scheduler;
    if let Some(interval_secs) = args.interval_secs {
        scheduler_config.interval_secs = interval_secs;
    }
    let engine = SnapshotEngine::new(engine_config(&config.engine, &args.pairs)?)?;
    let mut formats = FormatCache::from_config(engine.config());
    let source: Arc<dyn QuoteSource> = Arc::new(
        HttpQuoteSource::new(&config.source)
            .with_timeout_ms(scheduler_config.request_timeout_ms)
            .with_circuit_breaker(Arc::new(CircuitBreaker::for_refresh_interval(
                scheduler_config.interval(),
            ))),
    );

    let handle = RefreshScheduler::spawn(engine, source, scheduler_config)?;
    info!(
        interval_secs = scheduler_config.interval_secs,
        "watching quote feed; Ctrl-C to stop"
    );
    let mut updates = handle.subscribe();
    let mut completed = 0_u64;

    let outcome = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = updates.borrow_and_update().clone();
                if state.is_fetching() {
                    continue;
                }
                if let Err(error) = output::print(
                    &Board::from_state(&state),
                    cli.format,
                    cli.pretty,
                    &mut formats,
                ) {
                    break Err(error);
                }
                completed += 1;
                if args.cycles.is_some_and(|limit| completed >= limit) {
                    break Ok(());
                }
            }
            signal = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break signal.map_err(CliError::from);
            }
        }
    };

    handle.shutdown().await;
    outcome
}
