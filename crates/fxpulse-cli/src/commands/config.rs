use fxpulse_core::AppConfig;

use crate::cli::Cli;
use crate::error::CliError;

/// The API key is skipped by serialization, so this is safe to share.
pub fn run(config: &AppConfig, cli: &Cli) -> Result<(), CliError> {
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(config)?
    } else {
        serde_json::to_string(config)?
    };
    println!("{rendered}");
    Ok(())
}
