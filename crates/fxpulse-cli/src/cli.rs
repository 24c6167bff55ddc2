//! CLI argument definitions for fxpulse.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `snapshot` | Fetch quotes once and print the board |
//! | `compute` | Build the board from a saved quote reply, offline |
//! | `watch` | Keep the board fresh and reprint it after every cycle |
//! | `config` | Print the effective configuration |
//!
//! # Global Options
//!
//! | Option | Env | Description |
//! |--------|-----|-------------|
//! | `--config` | `FXPULSE_CONFIG` | JSON configuration file |
//! | `--endpoint` | `FXPULSE_ENDPOINT` | Quote feed URL |
//! | `--api-key` | `FXPULSE_API_KEY` | Quote feed credential |
//! | `--timeout-ms` | | Per-request timeout |
//! | `--format` | | `text` (default) or `json` |
//! | `--log-format` | `FXPULSE_LOG_FORMAT` | `compact`, `pretty` or `json` |
//!
//! # Examples
//!
//! ```bash
//! # One board for the default 29 pairs
//! fxpulse snapshot
//!
//! # Only the euro crosses, as JSON
//! fxpulse snapshot EURUSD EURJPY EURGBP --format json --pretty
//!
//! # Replay a captured reply
//! fxpulse compute reply.json --received-at 2024-05-01T12:00:00Z
//!
//! # Refresh every 30 seconds until interrupted
//! fxpulse watch --interval-secs 30
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;

/// fxpulse - live currency strength board
///
/// Ranks currencies by strength and volatility, lists the top movers and
/// tracks a composite dollar index from a spot FX quote feed.
#[derive(Debug, Parser)]
#[command(
    name = "fxpulse",
    author,
    version,
    about = "Currency strength, movers and composite index from spot FX quotes"
)]
pub struct Cli {
    /// JSON configuration file. Defaults are used when absent.
    #[arg(long, global = true, env = "FXPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Quote feed URL, overriding the configuration file.
    #[arg(long, global = true, env = "FXPULSE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Quote feed API key.
    #[arg(long, global = true, env = "FXPULSE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log line format on stderr. Verbosity follows `RUST_LOG`.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "FXPULSE_LOG_FORMAT",
        default_value_t = LogFormat::Compact
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text board for terminals.
    Text,
    /// One JSON object per board.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch quotes once and print the board.
    ///
    /// Examples:
    ///   fxpulse snapshot
    ///   fxpulse snapshot EURUSD USDJPY
    Snapshot(SnapshotArgs),

    /// Build the board from a saved quote-feed reply without any network.
    ///
    /// Examples:
    ///   fxpulse compute reply.json
    ///   curl -s "$URL" | fxpulse compute -
    Compute(ComputeArgs),

    /// Refresh on a timer and reprint the board after each cycle.
    ///
    /// Stops on Ctrl-C or after `--cycles` completed refreshes.
    Watch(WatchArgs),

    /// Print the effective configuration as JSON. The API key is never shown.
    Config,
}

#[derive(Debug, Clone, Args)]
pub struct SnapshotArgs {
    /// Pairs to request (EURUSD or EUR/USD). Defaults to the configured list.
    pub pairs: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ComputeArgs {
    /// Reply file, or `-` for stdin.
    pub input: PathBuf,

    /// Pairs to keep. Defaults to the configured list.
    #[arg(long = "pair", value_name = "PAIR")]
    pub pairs: Vec<String>,

    /// Receive time used when the reply carries no timestamps.
    #[arg(long)]
    pub received_at: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes, overriding the configuration.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Exit after this many completed refreshes.
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Pairs to request. Defaults to the configured list.
    #[arg(long = "pair", value_name = "PAIR")]
    pub pairs: Vec<String>,
}
