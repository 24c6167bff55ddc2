//! Parse boundary between raw provider payloads and validated quotes.
//!
//! A configured pair is looked up in the payload by symbol (`EURUSD`) and
//! then by label (`EUR/USD`). A record missing any required field, or
//! carrying a non-finite value in one, is dropped as a whole; nothing is
//! defaulted. Dropped records are logged at `debug` and never surface as
//! errors on their own.

use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::range::range_percent;
use crate::{InstrumentPair, NormalizedQuote, RawQuotePayload, RawQuoteRecord, RawValue, UtcDateTime};

/// Caller-selected strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Treat the absolute change as a required field.
    pub require_change: bool,
}

/// Quotes that survived validation plus the newest timestamp among them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub quotes: Vec<NormalizedQuote>,
    pub latest_timestamp_millis: Option<i64>,
}

impl NormalizedBatch {
    /// Newest provider timestamp, falling back to `received_at`.
    pub fn as_of(&self, received_at: UtcDateTime) -> UtcDateTime {
        self.latest_timestamp_millis
            .and_then(|millis| UtcDateTime::from_unix_millis(millis).ok())
            .unwrap_or(received_at)
    }
}

/// Why a single record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    Missing(&'static str),
    NotNumeric(&'static str),
    NonFinite(&'static str),
}

impl Display for RecordRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "field '{field}' is missing"),
            Self::NotNumeric(field) => write!(f, "field '{field}' is not numeric"),
            Self::NonFinite(field) => write!(f, "field '{field}' is not finite"),
        }
    }
}

/// Validate every configured pair present in `payload`, in configuration order.
pub fn normalize(
    payload: &RawQuotePayload,
    pairs: &[InstrumentPair],
    options: NormalizeOptions,
) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for pair in pairs {
        let symbol = pair.symbol();
        let Some(record) = payload
            .get(&symbol)
            .or_else(|| payload.get(&pair.label()))
        else {
            continue;
        };

        match normalize_record(*pair, record, options) {
            Ok(quote) => {
                if let Some(ts) = quote.timestamp_millis {
                    batch.latest_timestamp_millis =
                        Some(batch.latest_timestamp_millis.map_or(ts, |latest| latest.max(ts)));
                }
                batch.quotes.push(quote);
            }
            Err(reason) => {
                debug!(symbol = %symbol, %reason, "dropping malformed quote record");
            }
        }
    }

    batch
}

/// Validate one record for `pair`.
pub fn normalize_record(
    pair: InstrumentPair,
    record: &RawQuoteRecord,
    options: NormalizeOptions,
) -> Result<NormalizedQuote, RecordRejection> {
    let bid = required_number("bid", record.bid.as_ref())?;
    let change_percent = required_number("change_percent", record.change_percent.as_ref())?;
    let high = required_number("high", record.high.as_ref())?;
    let low = required_number("low", record.low.as_ref())?;
    let change = if options.require_change {
        Some(required_number("change", record.change.as_ref())?)
    } else {
        required_number("change", record.change.as_ref()).ok()
    };

    Ok(NormalizedQuote {
        symbol: pair.symbol(),
        pair,
        bid,
        change_percent,
        change,
        high,
        low,
        range_percent: range_percent(high, low),
        timestamp_millis: parse_timestamp_millis(record),
    })
}

fn required_number(field: &'static str, value: Option<&RawValue>) -> Result<f64, RecordRejection> {
    let value = value.ok_or(RecordRejection::Missing(field))?;
    let number = value.as_f64().ok_or(RecordRejection::NotNumeric(field))?;
    if number.is_finite() {
        Ok(number)
    } else {
        Err(RecordRejection::NonFinite(field))
    }
}

/// Epoch seconds win; otherwise the date-time string, read as UTC when zone-less.
fn parse_timestamp_millis(record: &RawQuoteRecord) -> Option<i64> {
    let from_epoch = record
        .timestamp
        .as_ref()
        .and_then(RawValue::as_i64)
        .and_then(|seconds| UtcDateTime::from_unix_seconds(seconds).ok());

    from_epoch
        .or_else(|| {
            record
                .datetime
                .as_ref()
                .and_then(RawValue::as_text)
                .and_then(|text| UtcDateTime::parse_lenient(text).ok())
        })
        .map(UtcDateTime::unix_millis)
}
