//! # fxpulse core
//!
//! Market snapshot engine for spot FX quotes: per-currency strength and
//! volatility rankings, top movers, and a weighted composite index, kept
//! fresh by a single-flight refresh scheduler.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Currency codes, pairs, raw and normalized quotes, timestamps |
//! | [`config`] | Engine, scheduler and source configuration |
//! | [`normalize`] | Raw record validation into [`NormalizedQuote`] |
//! | [`range`] | Session range as a percent of midpoint |
//! | [`contribution`] | Pair moves fanned out per currency |
//! | [`strength`] | Strength and volatility rankings with tone |
//! | [`composite`] | Weighted geometric composite index |
//! | [`movers`] | Gainers, losers and volatility buckets |
//! | [`snapshot`] | The pure `(config, quotes) -> Snapshot` engine |
//! | [`source`] | Quote source contract and errors |
//! | [`adapters`] | HTTP quote source |
//! | [`http_client`] | Transport abstraction over reqwest |
//! | [`circuit_breaker`] | Quote feed outage guard |
//! | [`refresh`] | Refresh state machine and scheduler |
//! | [`cache`] | Shared latest-snapshot cache |
//! | [`presentation`] | Number formatting and text board |
//!
//! ## Pipeline
//!
//! ```text
//! QuoteSource ──▶ RawQuotePayload ──▶ normalize ──▶ [NormalizedQuote]
//!                                                      │
//!           ┌──────────────┬──────────────┬────────────┤
//!           ▼              ▼              ▼            ▼
//!     contributions    composite       movers     (range per quote)
//!           │              │              │
//!           ▼              ▼              ▼
//!   strength/volatility ──────────▶ Snapshot ──▶ RefreshState ──▶ watch
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fxpulse_core::{EngineConfig, RawQuotePayload, RawQuoteRecord, SnapshotEngine, UtcDateTime};
//!
//! let engine = SnapshotEngine::new(EngineConfig::default()).unwrap();
//! let payload = RawQuotePayload::new().with(
//!     "EURUSD",
//!     RawQuoteRecord::default()
//!         .with_bid(1.0912)
//!         .with_change_percent(0.40)
//!         .with_range(1.0950, 1.0900),
//! );
//!
//! let built = engine.build(&payload, UtcDateTime::now()).unwrap();
//! assert_eq!(built.snapshot.top_gainers[0].symbol, "EURUSD");
//! assert!(built.snapshot.composite.is_none());
//! ```

pub mod adapters;
pub mod cache;
pub mod circuit_breaker;
pub mod composite;
pub mod config;
pub mod contribution;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod movers;
pub mod normalize;
pub mod presentation;
pub mod range;
pub mod refresh;
pub mod snapshot;
pub mod source;
pub mod strength;

pub use adapters::{parse_quote_body, HttpQuoteSource};
pub use cache::{CachedSnapshot, SnapshotCache};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use composite::CompositeIndexQuote;
pub use config::{
    AppConfig, BasketComponent, CompositeBasket, EngineConfig, SchedulerConfig, SourceConfig,
    ToneThresholds,
};
pub use domain::{
    CurrencyCode, InstrumentPair, NormalizedQuote, RawQuotePayload, RawQuoteRecord, RawValue,
    UtcDateTime,
};
pub use error::{CoreError, EngineError, RefreshError, ValidationError};
pub use http_client::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use movers::{TopMover, VolatilityPair};
pub use presentation::{render_text, FormatCache};
pub use refresh::{
    fetch_snapshot, RefreshPhase, RefreshScheduler, RefreshState, SchedulerHandle, StatusLine,
};
pub use snapshot::{BuiltSnapshot, Snapshot, SnapshotEngine};
pub use source::{
    QuoteRequest, QuoteSource, ScriptedQuoteSource, SourceError, SourceErrorKind,
    StaticQuoteSource,
};
pub use strength::{CurrencyStrengthEntry, CurrencyVolatilityEntry, Tone};
