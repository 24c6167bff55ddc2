//! Concrete quote sources.

mod http;

pub use http::{parse_quote_body, HttpQuoteSource};
