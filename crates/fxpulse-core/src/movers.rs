//! Top gainers/losers and most/least volatile pair buckets.
//!
//! Gainers take strictly positive moves and losers strictly negative ones,
//! so the two lists never share a pair. Volatility buckets only consider
//! quotes with a positive range. All sorts are stable: ties keep input order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::NormalizedQuote;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMover {
    pub symbol: String,
    pub pair_label: String,
    pub change_percent: f64,
    pub change: f64,
    pub pips_moved: f64,
    pub last_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPair {
    pub symbol: String,
    pub pair_label: String,
    pub range_percent: f64,
}

/// The four bucket lists of one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoverBuckets {
    pub top_gainers: Vec<TopMover>,
    pub top_losers: Vec<TopMover>,
    pub most_volatile_pairs: Vec<VolatilityPair>,
    pub least_volatile_pairs: Vec<VolatilityPair>,
}

pub fn select_movers(quotes: &[NormalizedQuote], config: &EngineConfig) -> MoverBuckets {
    let limit = config.movers_limit;

    let mut gainers: Vec<&NormalizedQuote> =
        quotes.iter().filter(|quote| quote.change_percent > 0.0).collect();
    gainers.sort_by(|a, b| compare(b.change_percent, a.change_percent));

    let mut losers: Vec<&NormalizedQuote> =
        quotes.iter().filter(|quote| quote.change_percent < 0.0).collect();
    losers.sort_by(|a, b| compare(a.change_percent, b.change_percent));

    let mut ranged: Vec<&NormalizedQuote> =
        quotes.iter().filter(|quote| quote.range_percent > 0.0).collect();
    ranged.sort_by(|a, b| compare(b.range_percent, a.range_percent));
    let most_volatile_pairs = ranged.iter().take(limit).map(|q| volatility_pair(q)).collect();

    ranged.sort_by(|a, b| compare(a.range_percent, b.range_percent));
    let least_volatile_pairs = ranged.iter().take(limit).map(|q| volatility_pair(q)).collect();

    MoverBuckets {
        top_gainers: gainers
            .into_iter()
            .take(limit)
            .map(|quote| top_mover(quote, config))
            .collect(),
        top_losers: losers
            .into_iter()
            .take(limit)
            .map(|quote| top_mover(quote, config))
            .collect(),
        most_volatile_pairs,
        least_volatile_pairs,
    }
}

fn compare(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn top_mover(quote: &NormalizedQuote, config: &EngineConfig) -> TopMover {
    let change = quote
        .change
        .unwrap_or_else(|| implied_change(quote.bid, quote.change_percent));

    TopMover {
        symbol: quote.symbol.clone(),
        pair_label: quote.label(),
        change_percent: quote.change_percent,
        change,
        pips_moved: change / config.pip_factor(quote.quote()),
        last_price: quote.bid,
    }
}

/// Absolute move implied by the last price and its percent change.
fn implied_change(last: f64, change_percent: f64) -> f64 {
    let previous = last / (1.0 + change_percent / 100.0);
    let change = last - previous;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

fn volatility_pair(quote: &NormalizedQuote) -> VolatilityPair {
    VolatilityPair {
        symbol: quote.symbol.clone(),
        pair_label: quote.label(),
        range_percent: quote.range_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InstrumentPair;

    fn quote(symbol: &str, change_percent: f64, range_percent: f64) -> NormalizedQuote {
        let pair = InstrumentPair::parse(symbol).expect("test pair");
        NormalizedQuote {
            symbol: pair.symbol(),
            pair,
            bid: 1.2,
            change_percent,
            change: Some(0.0012),
            high: 1.21,
            low: 1.19,
            range_percent,
            timestamp_millis: None,
        }
    }

    fn symbols<T>(items: &[T], symbol: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|item| symbol(item).to_owned()).collect()
    }

    #[test]
    fn gainers_and_losers_partition_by_sign() {
        let quotes = vec![
            quote("EURUSD", 0.30, 0.1),
            quote("GBPUSD", -0.20, 0.1),
            quote("USDJPY", 0.0, 0.1),
            quote("AUDUSD", 0.50, 0.1),
            quote("NZDUSD", -0.60, 0.1),
        ];
        let buckets = select_movers(&quotes, &EngineConfig::default());

        assert_eq!(
            symbols(&buckets.top_gainers, |m| m.symbol.as_str()),
            ["AUDUSD", "EURUSD"]
        );
        assert_eq!(
            symbols(&buckets.top_losers, |m| m.symbol.as_str()),
            ["NZDUSD", "GBPUSD"]
        );
    }

    #[test]
    fn buckets_are_capped_and_ties_keep_input_order() {
        let symbols_in = [
            "EURUSD", "GBPUSD", "AUDUSD", "NZDUSD", "USDCAD", "USDCHF", "EURGBP",
        ];
        let quotes: Vec<NormalizedQuote> = symbols_in
            .iter()
            .map(|symbol| quote(symbol, 0.25, 0.3))
            .collect();
        let buckets = select_movers(&quotes, &EngineConfig::default());

        assert_eq!(
            symbols(&buckets.top_gainers, |m| m.symbol.as_str()),
            ["EURUSD", "GBPUSD", "AUDUSD", "NZDUSD", "USDCAD"]
        );
        assert_eq!(
            symbols(&buckets.least_volatile_pairs, |v| v.symbol.as_str()),
            ["EURUSD", "GBPUSD", "AUDUSD", "NZDUSD", "USDCAD"]
        );
        assert!(buckets.top_losers.is_empty());
    }

    #[test]
    fn volatility_buckets_skip_zero_range() {
        let quotes = vec![
            quote("EURUSD", 0.1, 0.0),
            quote("GBPUSD", 0.1, 0.8),
            quote("USDJPY", 0.1, 0.3),
        ];
        let buckets = select_movers(&quotes, &EngineConfig::default());

        assert_eq!(
            symbols(&buckets.most_volatile_pairs, |v| v.symbol.as_str()),
            ["GBPUSD", "USDJPY"]
        );
        assert_eq!(
            symbols(&buckets.least_volatile_pairs, |v| v.symbol.as_str()),
            ["USDJPY", "GBPUSD"]
        );
    }

    #[test]
    fn pips_use_the_minor_unit_factor_for_yen_quotes() {
        let mut yen = quote("USDJPY", 0.4, 0.2);
        yen.change = Some(0.60);
        let buckets = select_movers(&[yen, quote("EURUSD", 0.3, 0.2)], &EngineConfig::default());

        assert!((buckets.top_gainers[0].pips_moved - 60.0).abs() < 1e-9);
        assert!((buckets.top_gainers[1].pips_moved - 12.0).abs() < 1e-9);
    }

    #[test]
    fn missing_absolute_change_is_implied_from_percent() {
        let mut eur = quote("EURUSD", 1.0, 0.2);
        eur.change = None;
        eur.bid = 1.01;
        let buckets = select_movers(&[eur], &EngineConfig::default());

        let mover = &buckets.top_gainers[0];
        assert!((mover.change - 0.01).abs() < 1e-9);
        assert!((mover.pips_moved - 100.0).abs() < 1e-6);
    }

    #[test]
    fn empty_input_yields_empty_buckets() {
        assert_eq!(
            select_movers(&[], &EngineConfig::default()),
            MoverBuckets::default()
        );
    }
}
