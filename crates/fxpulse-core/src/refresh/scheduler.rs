use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, warn};

use super::state::{Applied, RefreshState, StatusLine};
use crate::cache::SnapshotCache;
use crate::config::SchedulerConfig;
use crate::snapshot::{BuiltSnapshot, SnapshotEngine};
use crate::source::{QuoteRequest, QuoteSource};
use crate::{RefreshError, UtcDateTime, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Refresh,
    SetVisible(bool),
    Shutdown,
}

type CycleOutcome = (u64, Result<BuiltSnapshot, RefreshError>);

/// Periodic single-flight refresh loop on the tokio runtime.
///
/// ```rust,ignore
/// let handle = RefreshScheduler::spawn(engine, source, SchedulerConfig::default())?;
/// let mut updates = handle.subscribe();
/// while updates.changed().await.is_ok() {
///     println!("{}", updates.borrow().status_line());
/// }
/// ```
pub struct RefreshScheduler {
    engine: Arc<SnapshotEngine>,
    source: Arc<dyn QuoteSource>,
    config: SchedulerConfig,
    cache: Option<SnapshotCache>,
    visible: bool,
}

impl RefreshScheduler {
    pub fn new(
        engine: SnapshotEngine,
        source: Arc<dyn QuoteSource>,
        config: SchedulerConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            engine: Arc::new(engine),
            source,
            config,
            cache: None,
            visible: true,
        })
    }

    /// Also publish every accepted snapshot into a shared cache.
    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Start with the view hidden: no fetch until `set_visible(true)`.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn spawn(
        engine: SnapshotEngine,
        source: Arc<dyn QuoteSource>,
        config: SchedulerConfig,
    ) -> Result<SchedulerHandle, ValidationError> {
        Ok(Self::new(engine, source, config)?.start())
    }

    /// Must be called from within a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(RefreshState::new());

        let worker = Worker {
            engine: self.engine,
            source: self.source,
            config: self.config,
            cache: self.cache,
            visible: self.visible,
            state: RefreshState::new(),
            publisher: state_tx,
            results: result_tx,
            in_flight: None,
            next_tick: None,
            last_success: None,
        };
        let task = tokio::spawn(worker.run(command_rx, result_rx));

        SchedulerHandle {
            commands: command_tx,
            state: state_rx,
            task,
        }
    }
}

/// Control surface of a running scheduler.
///
/// Dropping the handle stops the loop as well; `shutdown` additionally
/// waits for it to finish.
#[derive(Debug)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<RefreshState>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Fetch now, superseding any fetch in flight.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    pub fn set_visible(&self, visible: bool) {
        self.send(Command::SetVisible(visible));
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.state.clone()
    }

    pub fn state(&self) -> RefreshState {
        self.state.borrow().clone()
    }

    pub fn status_line(&self) -> StatusLine {
        self.state.borrow().status_line()
    }

    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(error) = self.task.await {
            warn!(%error, "refresh scheduler task ended abnormally");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(?command, "refresh scheduler already stopped");
        }
    }
}

struct Worker {
    engine: Arc<SnapshotEngine>,
    source: Arc<dyn QuoteSource>,
    config: SchedulerConfig,
    cache: Option<SnapshotCache>,
    visible: bool,
    state: RefreshState,
    publisher: watch::Sender<RefreshState>,
    results: mpsc::UnboundedSender<CycleOutcome>,
    in_flight: Option<(u64, JoinHandle<()>)>,
    next_tick: Option<Instant>,
    last_success: Option<Instant>,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut results: mpsc::UnboundedReceiver<CycleOutcome>,
    ) {
        if self.visible {
            self.trigger("start");
        }

        loop {
            let tick = self.next_tick.filter(|_| self.visible);
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Refresh) => self.trigger("manual"),
                    Some(Command::SetVisible(visible)) => self.set_visible(visible),
                    Some(Command::Shutdown) | None => break,
                },
                Some((generation, result)) = results.recv() => {
                    self.finish(generation, result).await;
                }
                () = wait_until(tick) => self.trigger("timer"),
            }
        }

        self.abort_in_flight();
        self.publish();
        debug!("refresh scheduler stopped");
    }

    fn trigger(&mut self, reason: &'static str) {
        self.abort_in_flight();
        let generation = self.state.begin();
        self.next_tick = Some(Instant::now() + self.config.interval());
        debug!(generation, reason, "starting fetch");

        let engine = Arc::clone(&self.engine);
        let source = Arc::clone(&self.source);
        let results = self.results.clone();
        let request_timeout = self.config.request_timeout();
        let task = tokio::spawn(async move {
            let outcome = fetch_snapshot(&engine, source.as_ref(), request_timeout).await;
            // The worker may already be gone during shutdown.
            let _ = results.send((generation, outcome));
        });

        self.in_flight = Some((generation, task));
        self.publish();
    }

    fn abort_in_flight(&mut self) {
        if let Some((generation, task)) = self.in_flight.take() {
            task.abort();
            self.state.cancel(generation);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if !visible {
            debug!("view hidden; refresh timer suspended");
            return;
        }

        let interval = self.config.interval();
        match self.last_success {
            Some(at) if at.elapsed() < interval => {
                self.next_tick = Some(at + interval);
            }
            _ => self.trigger("visible"),
        }
    }

    async fn finish(&mut self, generation: u64, result: Result<BuiltSnapshot, RefreshError>) {
        if matches!(self.in_flight, Some((current, _)) if current == generation) {
            self.in_flight = None;
        }

        let succeeded = result.is_ok();
        if self.state.complete(generation, result) == Applied::Stale {
            return;
        }

        if succeeded {
            self.last_success = Some(Instant::now());
            if let (Some(cache), Some(snapshot), Some(as_of)) = (
                &self.cache,
                &self.state.last_snapshot,
                self.state.last_updated_at,
            ) {
                cache.publish(Arc::clone(snapshot), as_of).await;
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

/// One fetch-normalize-aggregate pass, bounded by `request_timeout`.
///
/// The scheduler runs this once per generation; one-shot callers can use
/// it directly.
pub async fn fetch_snapshot(
    engine: &SnapshotEngine,
    source: &dyn QuoteSource,
    request_timeout: Duration,
) -> Result<BuiltSnapshot, RefreshError> {
    let request = QuoteRequest::new(engine.requested_symbols())?;
    let payload = timeout(request_timeout, source.fetch(request))
        .await
        .map_err(|_| RefreshError::Timeout {
            timeout_ms: u64::try_from(request_timeout.as_millis()).unwrap_or(u64::MAX),
        })??;
    Ok(engine.build(&payload, UtcDateTime::now())?)
}
