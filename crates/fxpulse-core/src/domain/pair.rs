use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, ValidationError};

/// A quoted pair of two distinct currencies, e.g. EUR/USD.
///
/// Serializes as the compact symbol (`EURUSD`) and accepts `EURUSD`,
/// `EUR/USD` or `eur-usd` on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentPair {
    base: CurrencyCode,
    quote: CurrencyCode,
}

impl InstrumentPair {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Result<Self, ValidationError> {
        if base == quote {
            return Err(ValidationError::InvalidPair {
                value: format!("{base}{quote}"),
            });
        }
        Ok(Self { base, quote })
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidPair {
            value: input.to_owned(),
        };
        let compact: String = input
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '/' | '-' | '_' | ' '))
            .collect();
        if compact.len() != 6 || !compact.is_ascii() {
            return Err(invalid());
        }

        let base = CurrencyCode::parse(&compact[..3]).map_err(|_| invalid())?;
        let quote = CurrencyCode::parse(&compact[3..]).map_err(|_| invalid())?;
        Self::new(base, quote).map_err(|_| invalid())
    }

    pub const fn base(&self) -> CurrencyCode {
        self.base
    }

    pub const fn quote(&self) -> CurrencyCode {
        self.quote
    }

    /// Provider symbol, `EURUSD`.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Display label, `EUR/USD`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }

    /// The currency on the other side of `code`, if `code` is part of this pair.
    pub fn counterpart(&self, code: CurrencyCode) -> Option<CurrencyCode> {
        if code == self.base {
            Some(self.quote)
        } else if code == self.quote {
            Some(self.base)
        } else {
            None
        }
    }
}

impl Display for InstrumentPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for InstrumentPair {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for InstrumentPair {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InstrumentPair> for String {
    fn from(value: InstrumentPair) -> Self {
        value.symbol()
    }
}
