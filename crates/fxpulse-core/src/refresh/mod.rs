//! Refresh cycle bookkeeping and the scheduler that drives it.
//!
//! [`RefreshState`] holds the pure transitions; [`RefreshScheduler`] owns
//! one state instance on a tokio task and publishes every change over a
//! `watch` channel.

mod scheduler;
mod state;

pub use scheduler::{fetch_snapshot, RefreshScheduler, SchedulerHandle};
pub use state::{Applied, RefreshPhase, RefreshState, StatusLine};
