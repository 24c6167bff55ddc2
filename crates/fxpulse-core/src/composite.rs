//! Weighted geometric composite index over a fixed basket of pairs.
//!
//! `index = B * Π rate_i ^ w_i`. For negative weights the pair's session
//! high maps to the index low, so high and low are taken from opposite
//! ends before exponentiation and re-ordered at the end. The composite is
//! all-or-nothing: one missing or non-finite component yields `None`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::CompositeBasket;
use crate::NormalizedQuote;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndexQuote {
    pub name: String,
    pub last: f64,
    pub high: f64,
    pub low: f64,
    pub change_percent: f64,
}

/// Compute the composite from this cycle's quotes only.
pub fn composite_index(
    basket: &CompositeBasket,
    quotes: &[NormalizedQuote],
) -> Option<CompositeIndexQuote> {
    let by_pair: HashMap<_, _> = quotes.iter().map(|quote| (quote.pair, quote)).collect();

    let base = basket.base_constant;
    let mut last = base;
    let mut high = base;
    let mut low = base;
    let mut change_decimal = 0.0;

    for component in &basket.components {
        let quote = by_pair.get(&component.pair)?;
        let exponent = component.exponent;
        let (upper, lower) = if exponent >= 0.0 {
            (quote.high, quote.low)
        } else {
            (quote.low, quote.high)
        };

        last *= quote.bid.powf(exponent);
        high *= upper.powf(exponent);
        low *= lower.powf(exponent);
        change_decimal += exponent * (quote.change_percent / 100.0);
    }

    let change_percent = change_decimal * 100.0;
    let all_finite = [last, high, low, change_percent]
        .iter()
        .all(|value| value.is_finite());
    if !all_finite {
        return None;
    }

    Some(CompositeIndexQuote {
        name: basket.name.clone(),
        last,
        high: high.max(low),
        low: high.min(low),
        change_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BasketComponent;
    use crate::InstrumentPair;

    fn quote(symbol: &str, bid: f64, high: f64, low: f64, change_percent: f64) -> NormalizedQuote {
        let pair = InstrumentPair::parse(symbol).expect("test pair");
        NormalizedQuote {
            symbol: pair.symbol(),
            pair,
            bid,
            change_percent,
            change: None,
            high,
            low,
            range_percent: 0.0,
            timestamp_millis: None,
        }
    }

    fn two_pair_basket() -> CompositeBasket {
        CompositeBasket {
            name: String::from("TEST"),
            base_constant: 100.0,
            components: vec![
                BasketComponent {
                    pair: InstrumentPair::parse("EURUSD").expect("pair"),
                    exponent: -0.5,
                },
                BasketComponent {
                    pair: InstrumentPair::parse("USDJPY").expect("pair"),
                    exponent: 0.5,
                },
            ],
        }
    }

    fn basket_quotes() -> Vec<NormalizedQuote> {
        vec![
            quote("EURUSD", 1.0, 1.21, 0.81, 0.40),
            quote("USDJPY", 4.0, 9.0, 1.0, -0.20),
        ]
    }

    #[test]
    fn multiplies_exponentiated_rates_and_swaps_inverse_bounds() {
        let index = composite_index(&two_pair_basket(), &basket_quotes()).expect("complete basket");

        assert!((index.last - 200.0).abs() < 1e-9);
        // high: 100 * 0.81^-0.5 * 9^0.5, low: 100 * 1.21^-0.5 * 1^0.5
        assert!((index.high - 100.0 / 0.9 * 3.0).abs() < 1e-9);
        assert!((index.low - 100.0 / 1.1).abs() < 1e-9);
        assert!((index.change_percent - (-0.5 * 0.40 + 0.5 * -0.20)).abs() < 1e-9);
    }

    #[test]
    fn missing_component_omits_the_composite() {
        let mut quotes = basket_quotes();
        quotes.pop();
        assert_eq!(composite_index(&two_pair_basket(), &quotes), None);
    }

    #[test]
    fn non_finite_result_omits_the_composite() {
        let quotes = vec![
            quote("EURUSD", 0.0, 1.21, 0.81, 0.40),
            quote("USDJPY", 4.0, 9.0, 1.0, -0.20),
        ];
        assert_eq!(composite_index(&two_pair_basket(), &quotes), None);
    }

    #[test]
    fn repeated_calls_give_identical_results() {
        let basket = two_pair_basket();
        let quotes = basket_quotes();
        assert_eq!(
            composite_index(&basket, &quotes),
            composite_index(&basket, &quotes)
        );
    }

    #[test]
    fn high_never_falls_below_low() {
        let quotes = vec![
            quote("EURUSD", 1.0, 0.81, 1.21, 0.0),
            quote("USDJPY", 4.0, 1.0, 9.0, 0.0),
        ];
        let index = composite_index(&two_pair_basket(), &quotes).expect("complete basket");
        assert!(index.high >= index.low);
    }
}
