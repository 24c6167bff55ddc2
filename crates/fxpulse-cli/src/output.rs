use std::io::Write;

use fxpulse_core::{
    render_text, BuiltSnapshot, FormatCache, RefreshState, Snapshot, StatusLine, UtcDateTime,
};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// One board as printed: the snapshot, if any, and its status line.
#[derive(Debug, Clone)]
pub struct Board<'a> {
    pub snapshot: Option<&'a Snapshot>,
    pub status: StatusLine,
    pub as_of: Option<UtcDateTime>,
    pub error: Option<&'a str>,
}

impl<'a> Board<'a> {
    pub fn from_built(built: &'a BuiltSnapshot) -> Self {
        Self {
            snapshot: Some(built.snapshot.as_ref()),
            status: StatusLine::Synced(built.as_of),
            as_of: Some(built.as_of),
            error: None,
        }
    }

    pub fn from_state(state: &'a RefreshState) -> Self {
        Self {
            snapshot: state.last_snapshot.as_deref(),
            status: state.status_line(),
            as_of: state.last_updated_at,
            error: state.last_error.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BoardJson<'a> {
    status: String,
    as_of: Option<UtcDateTime>,
    error: Option<&'a str>,
    snapshot: Option<&'a Snapshot>,
}

pub fn render(
    board: &Board<'_>,
    format: OutputFormat,
    pretty: bool,
    formats: &mut FormatCache,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(render_text(board.snapshot, &board.status, formats)),
        OutputFormat::Json => {
            let json = BoardJson {
                status: board.status.to_string(),
                as_of: board.as_of,
                error: board.error,
                snapshot: board.snapshot,
            };
            if pretty {
                Ok(serde_json::to_string_pretty(&json)?)
            } else {
                Ok(serde_json::to_string(&json)?)
            }
        }
    }
}

pub fn print(
    board: &Board<'_>,
    format: OutputFormat,
    pretty: bool,
    formats: &mut FormatCache,
) -> Result<(), CliError> {
    let rendered = render(board, format, pretty, formats)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;

    fn built() -> BuiltSnapshot {
        BuiltSnapshot {
            snapshot: Arc::new(Snapshot {
                currency_strength: Vec::new(),
                top_gainers: Vec::new(),
                top_losers: Vec::new(),
                currency_volatility: Vec::new(),
                most_volatile_pairs: Vec::new(),
                least_volatile_pairs: Vec::new(),
                composite: None,
                quote_count: 2,
            }),
            as_of: UtcDateTime::parse("2024-05-01T12:00:00Z").expect("ts"),
        }
    }

    #[test]
    fn json_board_carries_status_and_snapshot() {
        let built = built();
        let rendered = render(
            &Board::from_built(&built),
            OutputFormat::Json,
            false,
            &mut FormatCache::default(),
        )
        .expect("render");

        let value: Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["status"], "synced 12:00:00 UTC");
        assert_eq!(value["as_of"], "2024-05-01T12:00:00Z");
        assert_eq!(value["snapshot"]["quote_count"], 2);
        assert!(!rendered.contains('\n'));
    }

    #[test]
    fn empty_state_renders_loading_board() {
        let state = RefreshState::new();
        let rendered = render(
            &Board::from_state(&state),
            OutputFormat::Text,
            false,
            &mut FormatCache::default(),
        )
        .expect("render");

        assert!(rendered.contains("Currency strength\n  unavailable"));
        assert!(rendered.ends_with("loading..."));
    }
}
