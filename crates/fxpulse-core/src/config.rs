//! Engine, scheduler and source configuration.
//!
//! Every section deserializes from JSON with defaults for missing keys, so
//! a config file only needs to name what it changes:
//!
//! ```json
//! {
//!   "engine": { "movers_limit": 3, "tone": { "strong": 0.15 } },
//!   "scheduler": { "interval_secs": 30 },
//!   "source": { "endpoint": "https://quotes.example.test/forex/latest" }
//! }
//! ```
//!
//! The tone thresholds and the composite basket weights are empirical
//! product constants; they live here so they can be tuned without code
//! changes.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CurrencyCode, InstrumentPair, ValidationError};

const DEFAULT_PAIRS: [&str; 29] = [
    "EURUSD", "GBPUSD", "USDJPY", "USDCHF", "USDCAD", "AUDUSD", "NZDUSD", "EURGBP", "EURJPY",
    "EURCHF", "EURCAD", "EURAUD", "EURNZD", "GBPJPY", "GBPCHF", "GBPCAD", "GBPAUD", "GBPNZD",
    "CHFJPY", "CADJPY", "AUDJPY", "NZDJPY", "CADCHF", "AUDCHF", "NZDCHF", "AUDCAD", "NZDCAD",
    "AUDNZD", "USDSEK",
];

/// US dollar index convention: constant and per-pair exponents.
const DOLLAR_INDEX_CONSTANT: f64 = 50.143_481_12;
const DOLLAR_INDEX_WEIGHTS: [(&str, f64); 6] = [
    ("EURUSD", -0.576),
    ("USDJPY", 0.136),
    ("GBPUSD", -0.119),
    ("USDCAD", 0.091),
    ("USDSEK", 0.042),
    ("USDCHF", 0.036),
];

fn parse_pairs(symbols: &[&str]) -> Vec<InstrumentPair> {
    symbols
        .iter()
        .filter_map(|symbol| InstrumentPair::parse(symbol).ok())
        .collect()
}

/// Score cut-offs for strength tone classification, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneThresholds {
    /// Scores at or above this are `strong` regardless of rank.
    pub strong: f64,
    /// Scores at or below this are `soft` regardless of rank.
    pub soft: f64,
    /// Scores within `±mixed_band` are summarised as mixed trading.
    pub mixed_band: f64,
}

impl Default for ToneThresholds {
    fn default() -> Self {
        Self {
            strong: 0.10,
            soft: -0.10,
            mixed_band: 0.05,
        }
    }
}

/// One weighted pair of a composite basket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasketComponent {
    #[serde(rename = "symbol")]
    pub pair: InstrumentPair,
    pub exponent: f64,
}

/// Fixed weighted basket for a synthetic geometric index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBasket {
    pub name: String,
    pub base_constant: f64,
    pub components: Vec<BasketComponent>,
}

impl CompositeBasket {
    pub fn dollar_index() -> Self {
        Self {
            name: String::from("DXY"),
            base_constant: DOLLAR_INDEX_CONSTANT,
            components: DOLLAR_INDEX_WEIGHTS
                .iter()
                .filter_map(|(symbol, exponent)| {
                    InstrumentPair::parse(symbol)
                        .ok()
                        .map(|pair| BasketComponent {
                            pair,
                            exponent: *exponent,
                        })
                })
                .collect(),
        }
    }
}

/// Inputs of the pure snapshot engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Configured pairs; their order fixes the currency order used to break ties.
    pub pairs: Vec<InstrumentPair>,
    pub composite: Option<CompositeBasket>,
    pub tone: ToneThresholds,
    /// Quote currencies whose pip is 0.01 instead of 0.0001.
    pub pip_minor_currencies: Vec<CurrencyCode>,
    pub movers_limit: usize,
    /// Drop records that carry no absolute change.
    pub require_change: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pairs: parse_pairs(&DEFAULT_PAIRS),
            composite: Some(CompositeBasket::dollar_index()),
            tone: ToneThresholds::default(),
            pip_minor_currencies: CurrencyCode::parse("JPY").into_iter().collect(),
            movers_limit: 5,
            require_change: false,
        }
    }
}

impl EngineConfig {
    pub fn with_pairs(pairs: Vec<InstrumentPair>) -> Self {
        Self {
            pairs,
            ..Self::default()
        }
    }

    pub fn without_composite(mut self) -> Self {
        self.composite = None;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pairs.is_empty() {
            return Err(ValidationError::EmptyPairList);
        }

        let mut seen = HashSet::with_capacity(self.pairs.len());
        for pair in &self.pairs {
            if !seen.insert(*pair) {
                return Err(ValidationError::DuplicatePair {
                    symbol: pair.symbol(),
                });
            }
        }

        if self.movers_limit == 0 {
            return Err(ValidationError::NonPositiveValue {
                field: "movers_limit",
            });
        }

        let tone = self.tone;
        let finite = tone.strong.is_finite() && tone.soft.is_finite() && tone.mixed_band.is_finite();
        if !finite || tone.soft >= 0.0 || tone.strong <= 0.0 || tone.mixed_band < 0.0 {
            return Err(ValidationError::InvalidToneThresholds);
        }

        if let Some(basket) = &self.composite {
            if basket.components.is_empty() {
                return Err(ValidationError::EmptyBasket {
                    name: basket.name.clone(),
                });
            }
            if !basket.base_constant.is_finite() {
                return Err(ValidationError::NonFiniteValue {
                    field: "base_constant",
                });
            }
            if basket.base_constant <= 0.0 {
                return Err(ValidationError::NonPositiveValue {
                    field: "base_constant",
                });
            }
            for component in &basket.components {
                if !component.exponent.is_finite() {
                    return Err(ValidationError::NonFiniteValue { field: "exponent" });
                }
                if !seen.contains(&component.pair) {
                    return Err(ValidationError::UnknownBasketPair {
                        name: basket.name.clone(),
                        symbol: component.pair.symbol(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Currencies in first-appearance order across the configured pairs.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut ordered = Vec::new();
        for pair in &self.pairs {
            for code in [pair.base(), pair.quote()] {
                if !ordered.contains(&code) {
                    ordered.push(code);
                }
            }
        }
        ordered
    }

    /// Size of one pip for a pair quoted in `quote`.
    pub fn pip_factor(&self, quote: CurrencyCode) -> f64 {
        if self.pip_minor_currencies.contains(&quote) {
            0.01
        } else {
            0.0001
        }
    }
}

/// Refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub request_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            request_timeout_ms: 10_000,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::NonPositiveValue {
                field: "interval_secs",
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::NonPositiveValue {
                field: "request_timeout_ms",
            });
        }
        Ok(())
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Quote feed location and credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub api_key_header: String,
    /// Supplied through the environment; never written back out.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("https://fcsapi.com/api-v3/forex/latest"),
            api_key_header: String::from("x-api-key"),
            api_key: None,
        }
    }
}

impl Debug for SourceConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key_header", &self.api_key_header)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Full application configuration as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub scheduler: SchedulerConfig,
    pub source: SourceConfig,
}

impl AppConfig {
    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.scheduler.validate()
    }
}
