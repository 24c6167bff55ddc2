//! Pure `(config, raw quotes) -> Snapshot` pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::composite::{composite_index, CompositeIndexQuote};
use crate::config::EngineConfig;
use crate::contribution::{contributions, group_by_currency};
use crate::movers::{select_movers, TopMover, VolatilityPair};
use crate::normalize::{normalize, NormalizeOptions};
use crate::strength::{
    currency_strength, currency_volatility, CurrencyStrengthEntry, CurrencyVolatilityEntry,
};
use crate::{CurrencyCode, EngineError, RawQuotePayload, UtcDateTime, ValidationError};

/// Everything the board shows for one refresh cycle.
///
/// Built in one go and shared as `Arc<Snapshot>`; a later cycle replaces
/// it rather than editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub currency_strength: Vec<CurrencyStrengthEntry>,
    pub top_gainers: Vec<TopMover>,
    pub top_losers: Vec<TopMover>,
    pub currency_volatility: Vec<CurrencyVolatilityEntry>,
    pub most_volatile_pairs: Vec<VolatilityPair>,
    pub least_volatile_pairs: Vec<VolatilityPair>,
    /// Absent when any basket component is missing this cycle.
    pub composite: Option<CompositeIndexQuote>,
    pub quote_count: usize,
}

/// A snapshot together with the time it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSnapshot {
    pub snapshot: Arc<Snapshot>,
    pub as_of: UtcDateTime,
}

/// Validated engine configuration plus the snapshot pipeline.
#[derive(Debug, Clone)]
pub struct SnapshotEngine {
    config: EngineConfig,
    currencies: Vec<CurrencyCode>,
}

impl SnapshotEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let currencies = config.currencies();
        Ok(Self { config, currencies })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Symbols to ask the quote source for.
    pub fn requested_symbols(&self) -> Vec<String> {
        self.config.pairs.iter().map(|pair| pair.symbol()).collect()
    }

    /// Run normalization and every aggregation over one payload.
    ///
    /// Fails only when no configured pair yields a usable quote.
    pub fn build(
        &self,
        payload: &RawQuotePayload,
        received_at: UtcDateTime,
    ) -> Result<BuiltSnapshot, EngineError> {
        let options = NormalizeOptions {
            require_change: self.config.require_change,
        };
        let batch = normalize(payload, &self.config.pairs, options);
        if batch.quotes.is_empty() {
            return Err(EngineError::EmptyResult {
                requested: self.config.pairs.len(),
            });
        }

        let groups = group_by_currency(&contributions(&batch.quotes), &self.currencies);
        let buckets = select_movers(&batch.quotes, &self.config);
        let composite = self
            .config
            .composite
            .as_ref()
            .and_then(|basket| composite_index(basket, &batch.quotes));
        if composite.is_none() && self.config.composite.is_some() {
            debug!("composite index unavailable this cycle");
        }

        let snapshot = Snapshot {
            currency_strength: currency_strength(&groups, &self.config.tone),
            top_gainers: buckets.top_gainers,
            top_losers: buckets.top_losers,
            currency_volatility: currency_volatility(&groups),
            most_volatile_pairs: buckets.most_volatile_pairs,
            least_volatile_pairs: buckets.least_volatile_pairs,
            composite,
            quote_count: batch.quotes.len(),
        };

        Ok(BuiltSnapshot {
            snapshot: Arc::new(snapshot),
            as_of: batch.as_of(received_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InstrumentPair, RawQuoteRecord};

    fn record(bid: f64, change_percent: f64, high: f64, low: f64) -> RawQuoteRecord {
        RawQuoteRecord::default()
            .with_bid(bid)
            .with_change_percent(change_percent)
            .with_range(high, low)
    }

    fn engine(symbols: &[&str]) -> SnapshotEngine {
        let pairs = symbols
            .iter()
            .map(|symbol| InstrumentPair::parse(symbol).expect("pair"))
            .collect();
        SnapshotEngine::new(EngineConfig::with_pairs(pairs).without_composite()).expect("engine")
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(SnapshotEngine::new(EngineConfig::with_pairs(Vec::new())).is_err());
    }

    #[test]
    fn empty_payload_is_an_engine_error() {
        let engine = engine(&["EURUSD", "USDJPY"]);
        let err = engine
            .build(&RawQuotePayload::new(), UtcDateTime::now())
            .expect_err("nothing usable");
        assert_eq!(err, EngineError::EmptyResult { requested: 2 });
    }

    #[test]
    fn as_of_falls_back_to_receipt_time() {
        let engine = engine(&["EURUSD"]);
        let received_at = UtcDateTime::parse("2024-05-01T12:00:00Z").expect("ts");
        let payload = RawQuotePayload::new().with("EURUSD", record(1.09, 0.2, 1.095, 1.09));

        let built = engine.build(&payload, received_at).expect("snapshot");
        assert_eq!(built.as_of, received_at);
        assert_eq!(built.snapshot.quote_count, 1);
    }

    #[test]
    fn composite_is_omitted_but_rest_is_built_when_basket_is_partial() {
        let config = EngineConfig::default();
        let engine = SnapshotEngine::new(config).expect("engine");
        let payload = RawQuotePayload::new()
            .with("EURUSD", record(1.09, 0.40, 1.095, 1.09))
            .with("USDJPY", record(149.5, 0.60, 149.8, 149.2));

        let built = engine.build(&payload, UtcDateTime::now()).expect("snapshot");
        assert!(built.snapshot.composite.is_none());
        assert_eq!(built.snapshot.currency_strength.len(), 3);
        assert_eq!(built.snapshot.top_gainers.len(), 2);
    }

    #[test]
    fn requested_symbols_follow_configuration() {
        let engine = engine(&["GBPJPY", "EURUSD"]);
        assert_eq!(engine.requested_symbols(), ["GBPJPY", "EURUSD"]);
    }
}
