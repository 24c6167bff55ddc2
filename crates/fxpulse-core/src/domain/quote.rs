use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CurrencyCode, InstrumentPair};

/// One loosely-typed provider field.
///
/// Feeds send numbers as JSON numbers or as strings (sometimes with a
/// trailing `%` or a leading `+`); anything else is kept verbatim so a
/// single odd field never fails the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Other(Value),
}

impl RawValue {
    /// Numeric reading of the field. Finiteness is not checked here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => {
                let cleaned: String = text
                    .trim()
                    .trim_end_matches('%')
                    .chars()
                    .filter(|ch| *ch != ',')
                    .collect();
                let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
                cleaned.parse::<f64>().ok()
            }
            Self::Other(_) => None,
        }
    }

    /// Integral reading, used for epoch-seconds fields.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(value) => {
                let in_range = value.is_finite()
                    && value.fract() == 0.0
                    && *value >= i64::MIN as f64
                    && *value <= i64::MAX as f64;
                in_range.then_some(*value as i64)
            }
            Self::Text(text) => text.trim().parse::<i64>().ok(),
            Self::Other(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Provider-shaped quote for one symbol. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuoteRecord {
    #[serde(default, alias = "b", skip_serializing_if = "Option::is_none")]
    pub bid: Option<RawValue>,
    #[serde(
        default,
        alias = "cp",
        alias = "changePercent",
        skip_serializing_if = "Option::is_none"
    )]
    pub change_percent: Option<RawValue>,
    #[serde(default, alias = "ch", skip_serializing_if = "Option::is_none")]
    pub change: Option<RawValue>,
    #[serde(default, alias = "h", skip_serializing_if = "Option::is_none")]
    pub high: Option<RawValue>,
    #[serde(default, alias = "l", skip_serializing_if = "Option::is_none")]
    pub low: Option<RawValue>,
    /// Epoch seconds.
    #[serde(default, alias = "t", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawValue>,
    /// Date-time string, UTC when no zone is given.
    #[serde(default, alias = "tm", skip_serializing_if = "Option::is_none")]
    pub datetime: Option<RawValue>,
}

impl RawQuoteRecord {
    pub fn with_bid(mut self, value: impl Into<RawValue>) -> Self {
        self.bid = Some(value.into());
        self
    }

    pub fn with_change_percent(mut self, value: impl Into<RawValue>) -> Self {
        self.change_percent = Some(value.into());
        self
    }

    pub fn with_change(mut self, value: impl Into<RawValue>) -> Self {
        self.change = Some(value.into());
        self
    }

    pub fn with_range(mut self, high: impl Into<RawValue>, low: impl Into<RawValue>) -> Self {
        self.high = Some(high.into());
        self.low = Some(low.into());
        self
    }

    pub fn with_timestamp(mut self, value: impl Into<RawValue>) -> Self {
        self.timestamp = Some(value.into());
        self
    }

    pub fn with_datetime(mut self, value: impl Into<RawValue>) -> Self {
        self.datetime = Some(value.into());
        self
    }
}

/// Raw provider reply keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuotePayload {
    records: BTreeMap<String, RawQuoteRecord>,
}

impl RawQuotePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from a JSON object of symbol → record, skipping
    /// entries that are not objects instead of rejecting the whole reply.
    pub fn from_json_object(object: serde_json::Map<String, Value>) -> Self {
        object
            .into_iter()
            .filter_map(|(symbol, value)| {
                serde_json::from_value::<RawQuoteRecord>(value)
                    .ok()
                    .map(|record| (symbol, record))
            })
            .collect()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, record: RawQuoteRecord) {
        self.records.insert(symbol.into().to_ascii_uppercase(), record);
    }

    pub fn with(mut self, symbol: impl Into<String>, record: RawQuoteRecord) -> Self {
        self.insert(symbol, record);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<&RawQuoteRecord> {
        self.records.get(symbol)
    }

    pub fn remove(&mut self, symbol: &str) -> Option<RawQuoteRecord> {
        self.records.remove(symbol)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

impl FromIterator<(String, RawQuoteRecord)> for RawQuotePayload {
    fn from_iter<I: IntoIterator<Item = (String, RawQuoteRecord)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (symbol, record) in iter {
            payload.insert(symbol, record);
        }
        payload
    }
}

/// Validated quote. All numeric fields are finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuote {
    pub symbol: String,
    pub pair: InstrumentPair,
    pub bid: f64,
    pub change_percent: f64,
    pub change: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub range_percent: f64,
    pub timestamp_millis: Option<i64>,
}

impl NormalizedQuote {
    pub fn base(&self) -> CurrencyCode {
        self.pair.base()
    }

    pub fn quote(&self) -> CurrencyCode {
        self.pair.quote()
    }

    pub fn label(&self) -> String {
        self.pair.label()
    }
}
