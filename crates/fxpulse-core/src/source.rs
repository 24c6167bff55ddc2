//! Quote source contract and its error type.
//!
//! A source turns a list of symbols into a [`RawQuotePayload`]. It never
//! validates records; that is the normalizer's job.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use crate::RawQuotePayload;

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    /// The transport gave up waiting for a reply.
    TimedOut,
    RateLimited,
    InvalidRequest,
    Malformed,
    Internal,
}

/// Structured error returned by quote sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::TimedOut,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::TimedOut => "source.timed_out",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Symbols to fetch in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub symbols: Vec<String>,
}

impl QuoteRequest {
    pub fn new(symbols: Vec<String>) -> Result<Self, SourceError> {
        if symbols.is_empty() {
            return Err(SourceError::invalid_request(
                "quote request must include at least one symbol",
            ));
        }
        Ok(Self { symbols })
    }
}

/// Call-and-response quote client.
///
/// Implementations must be `Send + Sync`; the scheduler shares one source
/// across fetch tasks and drops a fetch future mid-flight when it is
/// superseded.
pub trait QuoteSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        request: QuoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawQuotePayload, SourceError>> + Send + 'a>>;
}

/// Serves one fixed payload, filtered to the requested symbols.
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteSource {
    payload: RawQuotePayload,
}

impl StaticQuoteSource {
    pub fn new(payload: RawQuotePayload) -> Self {
        Self { payload }
    }
}

impl QuoteSource for StaticQuoteSource {
    fn fetch<'a>(
        &'a self,
        request: QuoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawQuotePayload, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            Ok(request
                .symbols
                .iter()
                .filter_map(|symbol| {
                    self.payload
                        .get(symbol)
                        .map(|record| (symbol.clone(), record.clone()))
                })
                .collect())
        })
    }
}

/// Replays a queue of scripted outcomes, then repeats the last one.
///
/// Used by tests and demos that need a source to fail or change between
/// cycles without a network.
#[derive(Debug, Default)]
pub struct ScriptedQuoteSource {
    script: Mutex<Vec<Result<RawQuotePayload, SourceError>>>,
    calls: Mutex<Vec<QuoteRequest>>,
}

impl ScriptedQuoteSource {
    pub fn new(script: Vec<Result<RawQuotePayload, SourceError>>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<QuoteRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn next_outcome(&self) -> Result<RawQuotePayload, SourceError> {
        let Ok(mut script) = self.script.lock() else {
            return Err(SourceError::internal("scripted source lock poisoned"));
        };
        match script.len() {
            0 => Err(SourceError::unavailable("scripted source is exhausted")),
            1 => script[0].clone(),
            _ => script
                .pop()
                .unwrap_or_else(|| Err(SourceError::internal("empty script"))),
        }
    }
}

impl QuoteSource for ScriptedQuoteSource {
    fn fetch<'a>(
        &'a self,
        request: QuoteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawQuotePayload, SourceError>> + Send + 'a>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}
