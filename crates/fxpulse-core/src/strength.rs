//! Per-currency strength and volatility rankings.
//!
//! Strength scores are the mean signed change a currency receives across
//! its pairs; volatility scores are the mean range. Both are ranked
//! descending with a stable sort, so equal scores keep the configured
//! currency order. Ranks are always `1..=N` without gaps.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::ToneThresholds;
use crate::contribution::{CurrencyContribution, CurrencyGroup};
use crate::CurrencyCode;

/// Absorbs float noise when a score sits exactly on a threshold.
const SCORE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Strong,
    Balanced,
    Soft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyStrengthEntry {
    pub code: CurrencyCode,
    /// 1 is strongest.
    pub rank: usize,
    pub tone: Tone,
    pub score: f64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyVolatilityEntry {
    pub code: CurrencyCode,
    /// 1 is most volatile.
    pub rank: usize,
    pub score: f64,
    pub summary: String,
}

/// Rank currencies by mean signed change and classify their tone.
pub fn currency_strength(
    groups: &[CurrencyGroup],
    thresholds: &ToneThresholds,
) -> Vec<CurrencyStrengthEntry> {
    let mut scored: Vec<(&CurrencyGroup, f64)> = groups
        .iter()
        .map(|group| (group, group.mean_change()))
        .collect();
    scored.sort_by(|a, b| descending(a.1, b.1));

    let total = scored.len();
    scored
        .into_iter()
        .enumerate()
        .map(|(index, (group, score))| {
            let rank = index + 1;
            CurrencyStrengthEntry {
                code: group.code,
                rank,
                tone: classify_tone(score, rank, total, thresholds),
                score,
                summary: strength_summary(group, score, thresholds.mixed_band),
            }
        })
        .collect()
}

/// Rank currencies by mean range.
pub fn currency_volatility(groups: &[CurrencyGroup]) -> Vec<CurrencyVolatilityEntry> {
    let mut scored: Vec<(&CurrencyGroup, f64)> = groups
        .iter()
        .map(|group| (group, group.mean_range()))
        .collect();
    scored.sort_by(|a, b| descending(a.1, b.1));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (group, score))| CurrencyVolatilityEntry {
            code: group.code,
            rank: index + 1,
            score,
            summary: volatility_summary(group),
        })
        .collect()
}

// Signed zeros compare equal so they do not reorder ties.
fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Absolute thresholds first; otherwise the outer thirds of the ranking
/// lean strong or soft when the score points the same way.
pub fn classify_tone(score: f64, rank: usize, total: usize, thresholds: &ToneThresholds) -> Tone {
    if score >= thresholds.strong - SCORE_EPSILON {
        return Tone::Strong;
    }
    if score <= thresholds.soft + SCORE_EPSILON {
        return Tone::Soft;
    }

    let third = total.div_ceil(3);
    if rank <= third && score > 0.0 {
        Tone::Strong
    } else if rank > total.saturating_sub(third) && score < 0.0 {
        Tone::Soft
    } else {
        Tone::Balanced
    }
}

fn strength_summary(group: &CurrencyGroup, score: f64, mixed_band: f64) -> String {
    let mut drivers: Vec<&CurrencyContribution> = group.contributions.iter().collect();
    drivers.sort_by(|a, b| {
        descending(a.signed_change_percent.abs(), b.signed_change_percent.abs())
    });
    let described: Vec<String> = drivers.into_iter().take(2).map(describe_driver).collect();

    let code = group.code;
    if score.abs() <= mixed_band + SCORE_EPSILON {
        format!(
            "{code} sees mixed trading ({score:+.2}% avg): {}.",
            described.join("; ")
        )
    } else {
        let verb = if score > 0.0 { "strengthens" } else { "softens" };
        format!(
            "{code} {verb} ({score:+.2}% avg), led by {}.",
            described.join(" and ")
        )
    }
}

fn describe_driver(contribution: &CurrencyContribution) -> String {
    let change = contribution.signed_change_percent;
    let direction = if change > 0.0 {
        "gains"
    } else if change < 0.0 {
        "losses"
    } else {
        "no change"
    };
    let counterpart = contribution
        .counterpart()
        .map(|code| code.to_string())
        .unwrap_or_default();

    format!(
        "{direction} vs {counterpart} ({change:+.2}% on {})",
        contribution.pair_label()
    )
}

fn volatility_summary(group: &CurrencyGroup) -> String {
    let mut top: Option<&CurrencyContribution> = None;
    for contribution in &group.contributions {
        if top.map_or(true, |best| contribution.range_percent > best.range_percent) {
            top = Some(contribution);
        }
    }

    match top {
        Some(driver) => format!(
            "{} most active via {} ({:.2}% range)",
            group.code,
            driver.pair_label(),
            driver.range_percent
        ),
        None => format!("{} has no range data", group.code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::{contributions, group_by_currency};
    use crate::{InstrumentPair, NormalizedQuote};

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

    fn groups(quotes: &[NormalizedQuote], order: &[&str]) -> Vec<CurrencyGroup> {
        let order: Vec<CurrencyCode> = order.iter().map(|value| code(value)).collect();
        group_by_currency(&contributions(quotes), &order)
    }

    #[test]
    fn usd_on_the_ten_basis_point_border_is_strong() {
        let groups = groups(
            &[quote("EURUSD", 0.40, 0.46), quote("USDJPY", 0.60, 0.40)],
            &["EUR", "USD", "JPY"],
        );
        let entries = currency_strength(&groups, &ToneThresholds::default());

        let ranked: Vec<(CurrencyCode, usize)> =
            entries.iter().map(|entry| (entry.code, entry.rank)).collect();
        assert_eq!(ranked, [(code("EUR"), 1), (code("USD"), 2), (code("JPY"), 3)]);

        let usd = &entries[1];
        assert!((usd.score - 0.10).abs() < 1e-9);
        assert_eq!(usd.tone, Tone::Strong);
        assert_eq!(entries[2].tone, Tone::Soft);
    }

    #[test]
    fn equal_scores_keep_configured_order() {
        let groups = groups(
            &[quote("EURUSD", 0.0, 0.1), quote("GBPJPY", 0.0, 0.1)],
            &["JPY", "GBP", "USD", "EUR"],
        );
        let entries = currency_strength(&groups, &ToneThresholds::default());
        let codes: Vec<CurrencyCode> = entries.iter().map(|entry| entry.code).collect();
        assert_eq!(codes, [code("JPY"), code("GBP"), code("USD"), code("EUR")]);
        assert!(entries.iter().all(|entry| entry.tone == Tone::Balanced));
    }

    #[test]
    fn outer_thirds_lean_with_their_sign() {
        let thresholds = ToneThresholds::default();
        // six currencies, thirds of two
        assert_eq!(classify_tone(0.05, 1, 6, &thresholds), Tone::Strong);
        assert_eq!(classify_tone(0.05, 3, 6, &thresholds), Tone::Balanced);
        assert_eq!(classify_tone(-0.02, 5, 6, &thresholds), Tone::Soft);
        assert_eq!(classify_tone(0.02, 6, 6, &thresholds), Tone::Balanced);
        assert_eq!(classify_tone(-0.02, 1, 6, &thresholds), Tone::Balanced);
        assert_eq!(classify_tone(-0.25, 1, 6, &thresholds), Tone::Soft);
    }

    #[test]
    fn summary_names_the_two_largest_drivers() {
        let groups = groups(
            &[
                quote("EURUSD", 0.10, 0.1),
                quote("EURJPY", 0.70, 0.1),
                quote("EURGBP", -0.30, 0.1),
            ],
            &["EUR"],
        );
        let eur = currency_strength(&groups, &ToneThresholds::default())
            .into_iter()
            .find(|entry| entry.code == code("EUR"))
            .expect("eur entry");

        assert!(eur.summary.starts_with("EUR strengthens"));
        assert!(eur.summary.contains("EUR/JPY"));
        assert!(eur.summary.contains("EUR/GBP"));
        assert!(!eur.summary.contains("EUR/USD"));
    }

    #[test]
    fn near_zero_scores_read_as_mixed_trading() {
        let groups = groups(
            &[quote("EURUSD", 0.30, 0.1), quote("EURJPY", -0.28, 0.1)],
            &["EUR"],
        );
        let eur = currency_strength(&groups, &ToneThresholds::default())
            .into_iter()
            .find(|entry| entry.code == code("EUR"))
            .expect("eur entry");
        assert_eq!(eur.rank, 2);
        assert!(eur.summary.contains("mixed trading"), "{}", eur.summary);
    }

    #[test]
    fn volatility_ranks_by_mean_range_with_one_driver() {
        let groups = groups(
            &[quote("EURUSD", 0.1, 0.20), quote("USDJPY", 0.1, 0.80)],
            &["EUR", "USD", "JPY"],
        );
        let entries = currency_volatility(&groups);

        let ranks: Vec<(CurrencyCode, usize)> =
            entries.iter().map(|entry| (entry.code, entry.rank)).collect();
        assert_eq!(ranks, [(code("JPY"), 1), (code("USD"), 2), (code("EUR"), 3)]);
        assert!(entries[1].summary.contains("USD/JPY"));
    }

    #[test]
    fn ranks_are_dense_and_unique() {
        let groups = groups(
            &[
                quote("EURUSD", 0.2, 0.3),
                quote("GBPUSD", -0.1, 0.2),
                quote("USDJPY", 0.3, 0.5),
                quote("AUDNZD", 0.0, 0.0),
            ],
            &["EUR", "USD", "GBP", "JPY", "AUD", "NZD"],
        );

        let mut strength: Vec<usize> = currency_strength(&groups, &ToneThresholds::default())
            .into_iter()
            .map(|entry| entry.rank)
            .collect();
        strength.sort_unstable();
        assert_eq!(strength, (1..=6).collect::<Vec<_>>());

        let mut volatility: Vec<usize> = currency_volatility(&groups)
            .into_iter()
            .map(|entry| entry.rank)
            .collect();
        volatility.sort_unstable();
        assert_eq!(volatility, (1..=6).collect::<Vec<_>>());
    }
}
