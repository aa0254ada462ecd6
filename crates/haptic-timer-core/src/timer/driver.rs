//! Async driver for the countdown clock.
//!
//! One logical timeline: commands, liveness callbacks and ticks are all
//! messages handled in order by a single loop. The 1-second ticker is a
//! task on the same runtime; it is replaced whenever the clock enters a new
//! run and aborted as soon as the clock leaves Running, before the next
//! message is handled.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::engine::{CountdownClock, TimerPhase};
use crate::events::Event;
use crate::interval::IntervalToggles;
use crate::liveness::LivenessEvent;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Source of wall-clock time for the clock.
pub type TimeSource = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    /// Pause when running, otherwise start or resume.
    Toggle,
    Stop,
    Reset,
    SetDuration(u64),
    SetToggles(IntervalToggles),
    ConfirmPermission,
    DeclinePermission,
    /// Emit a `StateSnapshot`.
    Snapshot,
    Shutdown,
}

struct Ticker {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct TimerDriver {
    clock: CountdownClock,
    events: mpsc::UnboundedSender<Event>,
    now: TimeSource,
    ticker: Option<Ticker>,
}

impl TimerDriver {
    pub fn new(clock: CountdownClock, events: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            clock,
            events,
            now: Arc::new(Utc::now),
            ticker: None,
        }
    }

    pub fn with_time_source(mut self, now: TimeSource) -> Self {
        self.now = now;
        self
    }

    pub fn clock(&self) -> &CountdownClock {
        &self.clock
    }

    /// Run until `Shutdown` or until every command sender is dropped.
    /// Returns the clock in its final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut liveness: mpsc::UnboundedReceiver<LivenessEvent>,
    ) -> CountdownClock {
        let (tick_tx, mut ticks) = mpsc::unbounded_channel::<u64>();

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.apply(command),
                    }
                }
                Some(event) = liveness.recv() => {
                    let now = (self.now)();
                    let events = self.clock.handle_liveness_at(event, now);
                    self.emit(events);
                }
                Some(generation) = ticks.recv() => {
                    let now = (self.now)();
                    let events = self.clock.tick_for(generation, now);
                    self.emit(events);
                }
            }
            self.sync_ticker(&tick_tx);
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.handle.abort();
        }
        self.clock
    }

    fn apply(&mut self, command: Command) {
        let now = (self.now)();
        debug!(?command, "command");
        let events = match command {
            Command::Start => self.clock.start_at(now),
            Command::Pause => self.clock.pause_at(now),
            Command::Toggle => self.clock.toggle_at(now),
            Command::Stop | Command::Reset => self.clock.stop_at(now),
            Command::SetDuration(secs) => match self.clock.set_duration_at(secs, now) {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "duration rejected");
                    Vec::new()
                }
            },
            Command::SetToggles(toggles) => {
                self.clock.set_toggles(toggles);
                Vec::new()
            }
            Command::ConfirmPermission => self.clock.confirm_permission_at(now),
            Command::DeclinePermission => self.clock.decline_permission_at(now),
            Command::Snapshot => vec![self.clock.snapshot_at(now)],
            Command::Shutdown => Vec::new(),
        };
        self.emit(events);
    }

    fn emit(&self, events: Vec<Event>) {
        for event in events {
            // nobody listening is fine
            let _ = self.events.send(event);
        }
    }

    /// Keep exactly one ticker alive, and only for the current run.
    fn sync_ticker(&mut self, tick_tx: &mpsc::UnboundedSender<u64>) {
        let running = self.clock.phase() == TimerPhase::Running;
        let generation = self.clock.run_generation();

        if let Some(ticker) = &self.ticker {
            if running && ticker.generation == generation {
                return;
            }
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.handle.abort();
        }
        if running {
            self.ticker = Some(Ticker {
                generation,
                handle: spawn_ticker(generation, tick_tx.clone()),
            });
        }
    }
}

fn spawn_ticker(generation: u64, tx: mpsc::UnboundedSender<u64>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(generation).is_err() {
                break;
            }
        }
    })
}
