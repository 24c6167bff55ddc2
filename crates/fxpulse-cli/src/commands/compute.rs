use std::io::Read;

use fxpulse_core::{parse_quote_body, AppConfig, FormatCache, SnapshotEngine, UtcDateTime};
use tracing::debug;

use crate::cli::{Cli, ComputeArgs};
use crate::error::CliError;
use crate::output::{self, Board};

use super::engine_config;

pub fn run(args: &ComputeArgs, config: &AppConfig, cli: &Cli) -> Result<(), CliError> {
    let body = if args.input.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        body
    } else {
        std::fs::read_to_string(&args.input)?
    };

    let payload = parse_quote_body(&body)?;
    debug!(records = payload.len(), "quote reply parsed");

    let received_at = match &args.received_at {
        Some(raw) => UtcDateTime::parse_lenient(raw)?,
        None => UtcDateTime::now(),
    };

    let engine = SnapshotEngine::new(engine_config(&config.engine, &args.pairs)?)?;
    let built = engine.build(&payload, received_at)?;

    let mut formats = FormatCache::from_config(engine.config());
    output::print(&Board::from_built(&built), cli.format, cli.pretty, &mut formats)
}
