//! # Domain Models
//!
//! Canonical domain types for fxpulse market snapshots.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CurrencyCode`] | Validated 3-letter ISO code |
//! | [`InstrumentPair`] | Base/quote pair, e.g. EUR/USD |
//! | [`RawQuoteRecord`] | Untrusted provider record |
//! | [`RawQuotePayload`] | Provider reply keyed by symbol |
//! | [`NormalizedQuote`] | Validated, finite quote |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Raw types are parsed into validated types exactly once, in
//! [`crate::normalize`]; nothing downstream sees a raw field.

mod currency;
mod pair;
mod quote;
mod timestamp;

pub use currency::CurrencyCode;
pub use pair::InstrumentPair;
pub use quote::{NormalizedQuote, RawQuotePayload, RawQuoteRecord, RawValue};
pub use timestamp::UtcDateTime;
