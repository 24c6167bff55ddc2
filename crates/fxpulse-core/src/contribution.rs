//! Fan-out of pair quotes into per-currency directional signals.
//!
//! A move of `c` percent on A/B credits A with `+c` and B with `-c`.
//! Range is shared unsigned by both sides.

use serde::Serialize;

use crate::{CurrencyCode, InstrumentPair, NormalizedQuote};

/// One currency's share of one pair's move. Rebuilt every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrencyContribution {
    pub currency: CurrencyCode,
    pub pair: InstrumentPair,
    pub signed_change_percent: f64,
    pub range_percent: f64,
}

impl CurrencyContribution {
    pub fn pair_label(&self) -> String {
        self.pair.label()
    }

    /// The other currency of the pair.
    pub fn counterpart(&self) -> Option<CurrencyCode> {
        self.pair.counterpart(self.currency)
    }
}

/// All contributions received by one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyGroup {
    pub code: CurrencyCode,
    pub contributions: Vec<CurrencyContribution>,
}

impl CurrencyGroup {
    pub fn mean_change(&self) -> f64 {
        mean(self.contributions.iter().map(|c| c.signed_change_percent))
    }

    pub fn mean_range(&self) -> f64 {
        mean(self.contributions.iter().map(|c| c.range_percent))
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

/// Two contributions per quote: base first, then quote currency.
pub fn contributions(quotes: &[NormalizedQuote]) -> Vec<CurrencyContribution> {
    quotes
        .iter()
        .flat_map(|quote| {
            [
                CurrencyContribution {
                    currency: quote.base(),
                    pair: quote.pair,
                    signed_change_percent: quote.change_percent,
                    range_percent: quote.range_percent,
                },
                CurrencyContribution {
                    currency: quote.quote(),
                    pair: quote.pair,
                    signed_change_percent: -quote.change_percent,
                    range_percent: quote.range_percent,
                },
            ]
        })
        .collect()
}

/// Group contributions by currency following `order`.
///
/// Currencies without contributions are omitted, never zero-filled.
/// Codes missing from `order` are appended in first-seen order.
pub fn group_by_currency(
    contributions: &[CurrencyContribution],
    order: &[CurrencyCode],
) -> Vec<CurrencyGroup> {
    let mut groups: Vec<CurrencyGroup> = order
        .iter()
        .map(|code| CurrencyGroup {
            code: *code,
            contributions: Vec::new(),
        })
        .collect();

    for contribution in contributions {
        match groups.iter_mut().find(|group| group.code == contribution.currency) {
            Some(group) => group.contributions.push(*contribution),
            None => groups.push(CurrencyGroup {
                code: contribution.currency,
                contributions: vec![*contribution],
            }),
        }
    }

    groups.retain(|group| !group.contributions.is_empty());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, change_percent: f64, range_percent: f64) -> NormalizedQuote {
        let pair = InstrumentPair::parse(symbol).expect("test pair");
        NormalizedQuote {
            symbol: pair.symbol(),
            pair,
            bid: 1.0,
            change_percent,
            change: None,
            high: 1.0,
            low: 1.0,
            range_percent,
            timestamp_millis: None,
        }
    }

    fn code(value: &str) -> CurrencyCode {
        CurrencyCode::parse(value).expect("test code")
    }

    #[test]
    fn base_gains_what_quote_loses() {
        let fanned = contributions(&[quote("EURUSD", 0.40, 0.46)]);
        assert_eq!(fanned.len(), 2);
        assert_eq!(fanned[0].currency, code("EUR"));
        assert_eq!(fanned[0].signed_change_percent, 0.40);
        assert_eq!(fanned[1].currency, code("USD"));
        assert_eq!(fanned[1].signed_change_percent, -0.40);
        assert_eq!(fanned[0].range_percent, fanned[1].range_percent);
    }

    #[test]
    fn groups_omit_currencies_without_contributions() {
        let fanned = contributions(&[quote("EURUSD", 0.40, 0.46)]);
        let groups = group_by_currency(&fanned, &[code("USD"), code("JPY"), code("EUR")]);

        let codes: Vec<CurrencyCode> = groups.iter().map(|group| group.code).collect();
        assert_eq!(codes, [code("USD"), code("EUR")]);
    }

    #[test]
    fn group_means_average_signed_change_and_range() {
        let fanned = contributions(&[quote("EURUSD", 0.40, 0.4), quote("USDJPY", 0.60, 0.2)]);
        let groups = group_by_currency(&fanned, &[code("EUR"), code("USD"), code("JPY")]);
        let usd = groups.iter().find(|g| g.code == code("USD")).expect("usd group");

        assert!((usd.mean_change() - 0.10).abs() < 1e-9);
        assert!((usd.mean_range() - 0.3).abs() < 1e-9);
    }
}
