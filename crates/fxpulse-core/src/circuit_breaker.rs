//! Outage guard for the quote feed.
//!
//! Only outages trip the circuit: transport failures, timeouts, 5xx replies
//! and unreadable bodies. A rate-limited reply proves the feed is up, so it
//! never counts towards opening, though it does send a trial fetch back to
//! cooling down. The cool-down is measured in refresh intervals so an open
//! circuit sits out whole cycles instead of an arbitrary wall-clock span.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::source::{SourceError, SourceErrorKind};

const DEFAULT_OUTAGE_THRESHOLD: u32 = 3;
const COOL_DOWN_CYCLES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive outages that open the circuit.
    pub failure_threshold: u32,
    /// How long an open circuit skips the feed before a trial fetch.
    pub cool_down: Duration,
}

impl CircuitBreakerConfig {
    /// Sit out three refresh cycles after three consecutive outages.
    pub fn for_refresh_interval(interval: Duration) -> Self {
        Self {
            failure_threshold: DEFAULT_OUTAGE_THRESHOLD,
            cool_down: interval.saturating_mul(COOL_DOWN_CYCLES),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::for_refresh_interval(Duration::from_secs(60))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Circuit {
    Closed { outages: u32 },
    Open { retry_at: Instant },
    /// Cool-down is over; the next outcome decides.
    Trial,
}

/// Shared by every fetch of one [`crate::HttpQuoteSource`].
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuit: Mutex::new(Circuit::Closed { outages: 0 }),
        }
    }

    pub fn for_refresh_interval(interval: Duration) -> Self {
        Self::new(CircuitBreakerConfig::for_refresh_interval(interval))
    }

    // The guarded value is a plain enum, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.circuit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Let a fetch through, or explain why the feed is being skipped.
    ///
    /// Trial fetches are not exclusive: a superseded fetch is dropped
    /// without reporting, and must not leave the circuit stuck.
    pub fn admit(&self) -> Result<(), SourceError> {
        let mut circuit = self.lock();
        match *circuit {
            Circuit::Closed { .. } | Circuit::Trial => Ok(()),
            Circuit::Open { retry_at } => {
                let now = Instant::now();
                if now >= retry_at {
                    info!("quote feed cool-down over; trying it again");
                    *circuit = Circuit::Trial;
                    return Ok(());
                }
                let remaining = retry_at.duration_since(now).as_secs().max(1);
                Err(SourceError::unavailable(format!(
                    "quote feed is cooling down after repeated outages; next attempt in {remaining}s"
                )))
            }
        }
    }

    /// Fold the outcome of an admitted fetch into the circuit.
    pub fn record(&self, outcome: Result<(), &SourceError>) {
        let mut circuit = self.lock();
        *circuit = match (outcome, *circuit) {
            (Ok(()), _) => Circuit::Closed { outages: 0 },
            (Err(error), Circuit::Trial) => {
                warn!(%error, "quote feed trial failed; cooling down again");
                self.open()
            }
            (Err(error), Circuit::Closed { outages }) if is_outage(error) => {
                let outages = outages.saturating_add(1);
                if outages >= self.config.failure_threshold {
                    warn!(outages, %error, "quote feed considered down");
                    self.open()
                } else {
                    Circuit::Closed { outages }
                }
            }
            (Err(_), unchanged) => unchanged,
        };
    }

    fn open(&self) -> Circuit {
        Circuit::Open {
            retry_at: Instant::now() + self.config.cool_down,
        }
    }

    pub fn state(&self) -> CircuitState {
        match *self.lock() {
            Circuit::Closed { .. } => CircuitState::Closed,
            Circuit::Open { .. } => CircuitState::Open,
            Circuit::Trial => CircuitState::HalfOpen,
        }
    }
}

fn is_outage(error: &SourceError) -> bool {
    matches!(
        error.kind(),
        SourceErrorKind::Unavailable | SourceErrorKind::TimedOut | SourceErrorKind::Malformed
    )
}
