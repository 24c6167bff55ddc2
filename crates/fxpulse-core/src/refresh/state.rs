//! Refresh generations, stale-result discard and the status line.
//!
//! Pure state: the scheduler drives it, tests poke it directly.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::snapshot::{BuiltSnapshot, Snapshot};
use crate::{RefreshError, UtcDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Fetching,
}

/// What happened to a completion or cancellation handed to [`RefreshState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Accepted,
    /// A newer generation has started since; the input was ignored.
    Stale,
}

/// Everything the presentation layer needs between cycles.
///
/// Only the most recently started generation may change the state. A
/// failed cycle keeps the last good snapshot and its timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshState {
    pub phase: RefreshPhase,
    pub generation: u64,
    pub last_snapshot: Option<Arc<Snapshot>>,
    pub last_updated_at: Option<UtcDateTime>,
    pub last_error: Option<String>,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self {
            phase: RefreshPhase::Idle,
            generation: 0,
            last_snapshot: None,
            last_updated_at: None,
            last_error: None,
        }
    }
}

impl RefreshState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fetching(&self) -> bool {
        self.phase == RefreshPhase::Fetching
    }

    /// Start a new fetch and return its generation.
    ///
    /// Any fetch still outstanding becomes stale.
    pub fn begin(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.phase = RefreshPhase::Fetching;
        self.generation
    }

    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<BuiltSnapshot, RefreshError>,
    ) -> Applied {
        if generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "discarding result of superseded fetch"
            );
            return Applied::Stale;
        }

        self.phase = RefreshPhase::Idle;
        match result {
            Ok(built) => {
                info!(
                    generation,
                    quotes = built.snapshot.quote_count,
                    as_of = %built.as_of,
                    "snapshot refreshed"
                );
                self.last_updated_at = Some(match self.last_updated_at {
                    Some(previous) if previous > built.as_of => previous,
                    _ => built.as_of,
                });
                self.last_snapshot = Some(built.snapshot);
                self.last_error = None;
            }
            Err(error) => {
                warn!(generation, %error, "refresh cycle failed");
                self.last_error = Some(error.user_message());
            }
        }
        Applied::Accepted
    }

    /// Abort a fetch. Not an error: nothing but the phase changes.
    pub fn cancel(&mut self, generation: u64) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        debug!(generation, "fetch cancelled");
        self.phase = RefreshPhase::Idle;
        Applied::Accepted
    }

    pub fn status_line(&self) -> StatusLine {
        if self.is_fetching() {
            return StatusLine::Fetching;
        }
        if let Some(message) = &self.last_error {
            return StatusLine::RetryPending(message.clone());
        }
        match self.last_updated_at {
            Some(at) => StatusLine::Synced(at),
            None => StatusLine::Loading,
        }
    }
}

/// The one-line sync indicator shown under the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Loading,
    Fetching,
    Synced(UtcDateTime),
    RetryPending(String),
}

impl Display for StatusLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => f.write_str("loading..."),
            Self::Fetching => f.write_str("fetching..."),
            Self::Synced(at) => write!(f, "synced {} UTC", at.format_clock()),
            Self::RetryPending(message) => f.write_str(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;
    use crate::source::SourceError;
    use crate::EngineError;

    fn built(at: &str, quote_count: usize) -> BuiltSnapshot {
        BuiltSnapshot {
            snapshot: Arc::new(Snapshot {
                currency_strength: Vec::new(),
                top_gainers: Vec::new(),
                top_losers: Vec::new(),
                currency_volatility: Vec::new(),
                most_volatile_pairs: Vec::new(),
                least_volatile_pairs: Vec::new(),
                composite: None,
                quote_count,
            }),
            as_of: UtcDateTime::parse(at).expect("test timestamp"),
        }
    }

    #[test]
    fn success_records_snapshot_and_clears_error() {
        let mut state = RefreshState::new();
        let first = state.begin();
        state.complete(first, Err(SourceError::unavailable("down").into()));
        assert!(state.last_error.is_some());

        let second = state.begin();
        assert_eq!(
            state.complete(second, Ok(built("2024-05-01T12:00:00Z", 3))),
            Applied::Accepted
        );
        assert_eq!(state.phase, RefreshPhase::Idle);
        assert_eq!(state.last_error, None);
        assert_eq!(state.last_snapshot.as_ref().map(|s| s.quote_count), Some(3));
    }

    #[test]
    fn failure_preserves_last_good_snapshot_and_time() {
        let mut state = RefreshState::new();
        let generation = state.begin();
        state.complete(generation, Ok(built("2024-05-01T12:00:00Z", 3)));
        let before = state.clone();

        let generation = state.begin();
        state.complete(
            generation,
            Err(EngineError::EmptyResult { requested: 29 }.into()),
        );

        assert_eq!(state.last_snapshot, before.last_snapshot);
        assert_eq!(state.last_updated_at, before.last_updated_at);
        assert_eq!(
            state.status_line(),
            StatusLine::RetryPending(String::from(
                "quote feed returned no usable quotes; retrying next cycle"
            ))
        );
    }

    #[test]
    fn superseded_generation_is_discarded() {
        let mut state = RefreshState::new();
        let old = state.begin();
        let new = state.begin();

        assert_eq!(
            state.complete(old, Ok(built("2024-05-01T12:00:00Z", 1))),
            Applied::Stale
        );
        assert!(state.is_fetching());
        assert!(state.last_snapshot.is_none());

        state.complete(new, Ok(built("2024-05-01T12:01:00Z", 2)));
        assert_eq!(state.last_snapshot.as_ref().map(|s| s.quote_count), Some(2));
    }

    #[test]
    fn cancellation_is_silent() {
        let mut state = RefreshState::new();
        let generation = state.begin();
        assert_eq!(state.cancel(generation), Applied::Accepted);

        assert_eq!(state.phase, RefreshPhase::Idle);
        assert_eq!(state.last_error, None);
        assert_eq!(state.status_line(), StatusLine::Loading);
        assert_eq!(state.cancel(generation + 1), Applied::Stale);
    }

    #[test]
    fn last_updated_at_never_moves_backwards() {
        let mut state = RefreshState::new();
        let generation = state.begin();
        state.complete(generation, Ok(built("2024-05-01T12:05:00Z", 1)));

        let generation = state.begin();
        state.complete(generation, Ok(built("2024-05-01T12:00:00Z", 2)));

        assert_eq!(
            state.last_updated_at,
            Some(UtcDateTime::parse("2024-05-01T12:05:00Z").expect("ts"))
        );
        assert_eq!(state.last_snapshot.as_ref().map(|s| s.quote_count), Some(2));
    }

    #[test]
    fn status_line_renders_each_phase() {
        let mut state = RefreshState::new();
        assert_eq!(state.status_line().to_string(), "loading...");

        let generation = state.begin();
        assert_eq!(state.status_line().to_string(), "fetching...");

        state.complete(generation, Ok(built("2024-05-01T09:30:15Z", 1)));
        assert_eq!(state.status_line().to_string(), "synced 09:30:15 UTC");
    }
}
