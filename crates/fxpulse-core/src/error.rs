use thiserror::Error;

use crate::source::{SourceError, SourceErrorKind};

/// Validation and contract errors exposed by `fxpulse-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("currency must be a 3-letter ISO code: '{value}'")]
    InvalidCurrency { value: String },
    #[error("pair must be two distinct currencies such as EURUSD or EUR/USD: '{value}'")]
    InvalidPair { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unrecognised date-time '{value}'")]
    InvalidTimestamp { value: String },
    #[error("epoch value {value} is out of range")]
    EpochOutOfRange { value: i64 },

    #[error("configuration must list at least one pair")]
    EmptyPairList,
    #[error("pair '{symbol}' is configured more than once")]
    DuplicatePair { symbol: String },
    #[error("composite basket '{name}' references unconfigured pair '{symbol}'")]
    UnknownBasketPair { name: String, symbol: String },
    #[error("composite basket '{name}' must contain at least one component")]
    EmptyBasket { name: String },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },
    #[error("tone thresholds must satisfy soft < 0 < strong and mixed_band >= 0")]
    InvalidToneThresholds,
}

/// Failure of the pure snapshot build.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("no usable quotes among {requested} requested pairs")]
    EmptyResult { requested: usize },
}

/// Reason a refresh cycle produced no snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("quote request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

impl RefreshError {
    /// Message shown on the status line until the next successful cycle.
    pub fn user_message(&self) -> String {
        let reason = match self {
            Self::Source(error) => match error.kind() {
                SourceErrorKind::TimedOut => "quote feed timed out",
                SourceErrorKind::RateLimited => "quote feed is rate limited",
                SourceErrorKind::Malformed => "quote feed sent an unreadable reply",
                SourceErrorKind::InvalidRequest => "quote request was rejected",
                _ => "quote feed is unreachable",
            },
            Self::Engine(EngineError::EmptyResult { .. }) => "quote feed returned no usable quotes",
            Self::Timeout { .. } => "quote feed timed out",
        };
        format!("{reason}; retrying next cycle")
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
