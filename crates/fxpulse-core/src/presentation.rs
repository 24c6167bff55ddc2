//! Plain-text rendering of a snapshot board.
//!
//! Formatting state lives in a [`FormatCache`] owned by whoever renders;
//! the engine never formats numbers.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::config::EngineConfig;
use crate::refresh::StatusLine;
use crate::snapshot::Snapshot;
use crate::strength::Tone;
use crate::{CurrencyCode, InstrumentPair};

const MINOR_UNIT_DECIMALS: usize = 3;
const DEFAULT_DECIMALS: usize = 5;

/// Memoized per-symbol number formatting.
#[derive(Debug, Clone, Default)]
pub struct FormatCache {
    minor_unit_currencies: Vec<CurrencyCode>,
    decimals: HashMap<String, usize>,
}

impl FormatCache {
    pub fn new(minor_unit_currencies: Vec<CurrencyCode>) -> Self {
        Self {
            minor_unit_currencies,
            decimals: HashMap::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.pip_minor_currencies.clone())
    }

    /// Price decimals for a symbol: 3 when quoted in a minor-unit
    /// currency such as JPY, else 5.
    pub fn decimals(&mut self, symbol: &str) -> usize {
        if let Some(decimals) = self.decimals.get(symbol) {
            return *decimals;
        }
        let decimals = match InstrumentPair::parse(symbol) {
            Ok(pair) if self.minor_unit_currencies.contains(&pair.quote()) => MINOR_UNIT_DECIMALS,
            _ => DEFAULT_DECIMALS,
        };
        self.decimals.insert(symbol.to_owned(), decimals);
        decimals
    }

    pub fn price(&mut self, symbol: &str, value: f64) -> String {
        let decimals = self.decimals(symbol);
        format!("{value:.decimals$}")
    }

    pub fn len(&self) -> usize {
        self.decimals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decimals.is_empty()
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{value:+.2}%")
}

pub fn format_pips(value: f64) -> String {
    format!("{value:+.1} pips")
}

fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Strong => "strong",
        Tone::Balanced => "balanced",
        Tone::Soft => "soft",
    }
}

/// Render the board followed by the status line.
///
/// Without a snapshot every section reads "unavailable"; an empty bucket
/// reads "no data".
pub fn render_text(
    snapshot: Option<&Snapshot>,
    status: &StatusLine,
    formats: &mut FormatCache,
) -> String {
    let mut out = String::new();

    section(&mut out, "Currency strength", snapshot, formats, |s, out, _| {
        for entry in &s.currency_strength {
            let _ = writeln!(
                out,
                "  {:>2}. {}  {:<8} {:>7}  {}",
                entry.rank,
                entry.code,
                tone_label(entry.tone),
                format_percent(entry.score),
                entry.summary
            );
        }
        s.currency_strength.is_empty()
    });

    section(&mut out, "Currency volatility", snapshot, formats, |s, out, _| {
        for entry in &s.currency_volatility {
            let _ = writeln!(
                out,
                "  {:>2}. {}  {:>6.2}%  {}",
                entry.rank, entry.code, entry.score, entry.summary
            );
        }
        s.currency_volatility.is_empty()
    });

    for (title, gainers) in [("Top gainers", true), ("Top losers", false)] {
        section(&mut out, title, snapshot, formats, |s, out, formats| {
            let movers = if gainers { &s.top_gainers } else { &s.top_losers };
            for mover in movers {
                let _ = writeln!(
                    out,
                    "  {:<8} {:>7}  {:>12}  {}",
                    mover.pair_label,
                    format_percent(mover.change_percent),
                    format_pips(mover.pips_moved),
                    formats.price(&mover.symbol, mover.last_price)
                );
            }
            movers.is_empty()
        });
    }

    for (title, most) in [("Most volatile pairs", true), ("Least volatile pairs", false)] {
        section(&mut out, title, snapshot, formats, |s, out, _| {
            let pairs = if most {
                &s.most_volatile_pairs
            } else {
                &s.least_volatile_pairs
            };
            for pair in pairs {
                let _ = writeln!(out, "  {:<8} {:>6.2}%", pair.pair_label, pair.range_percent);
            }
            pairs.is_empty()
        });
    }

    out.push_str("Composite index\n");
    match snapshot.and_then(|s| s.composite.as_ref()) {
        Some(index) => {
            let _ = writeln!(
                out,
                "  {}  {:.3} ({})  high {:.3}  low {:.3}",
                index.name,
                index.last,
                format_percent(index.change_percent),
                index.high,
                index.low
            );
        }
        None => out.push_str("  unavailable\n"),
    }

    let _ = write!(out, "\n{status}");
    out
}

/// Title, then the body's lines or a placeholder. `body` returns whether
/// it had nothing to show.
fn section(
    out: &mut String,
    title: &str,
    snapshot: Option<&Snapshot>,
    formats: &mut FormatCache,
    body: impl FnOnce(&Snapshot, &mut String, &mut FormatCache) -> bool,
) {
    let _ = writeln!(out, "{title}");
    match snapshot {
        Some(snapshot) => {
            if body(snapshot, out, formats) {
                out.push_str("  no data\n");
            }
        }
        None => out.push_str("  unavailable\n"),
    }
    out.push('\n');
}
