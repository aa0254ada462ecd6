//! Countdown clock.
//!
//! The clock is a wall-clock-based state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` about once a
//! second while running (see [`TimerDriver`](super::TimerDriver)).
//!
//! Remaining time is never decremented. While running it is derived from
//! `end_at - now` on every observation, so a late or skipped tick catches
//! up in a single step.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Finished) -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut clock = CountdownClock::new(duration, dispatcher, liveness);
//! clock.start();
//! // About once a second:
//! for event in clock.tick() { /* render */ }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::duration::TimerDuration;
use crate::error::ValidationError;
use crate::events::Event;
use crate::feedback::{
    ChannelCapabilities, DeliveryResult, FeedbackDispatcher, PermissionGate, PermissionStatus,
};
use crate::interval::{FeedbackTier, IntervalPolicy, IntervalToggles};
use crate::liveness::{InvalidationOutcome, LivenessEvent, LivenessSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    /// Reached zero. Stays here until `stop()`/`reset()`.
    Finished,
}

/// Core countdown state machine.
///
/// Owns the countdown state exclusively. Observers read snapshots; every
/// mutation goes through `start`, `pause`, `stop`, `reset` or
/// `set_duration`.
pub struct CountdownClock {
    duration: TimerDuration,
    /// Duration set while running, applied on the next stop/reset.
    pending_duration: Option<TimerDuration>,
    /// Last observed remaining seconds. Ground truth only when not running.
    remaining: u32,
    /// Present iff running.
    end_at: Option<DateTime<Utc>>,
    phase: TimerPhase,
    policy: IntervalPolicy,
    dispatcher: FeedbackDispatcher,
    liveness: LivenessSession,
    permission: PermissionGate,
    /// Bumped on every entry into and exit from Running. Ticks scheduled
    /// for an older run are ignored.
    run_generation: u64,
    /// Second already signalled in this run, so a repeated observation
    /// does not fire twice.
    last_signalled: Option<u32>,
}

impl CountdownClock {
    /// Create a clock in the `Idle` state with `remaining == duration`.
    pub fn new(
        duration: TimerDuration,
        dispatcher: FeedbackDispatcher,
        liveness: LivenessSession,
    ) -> Self {
        Self {
            duration,
            pending_duration: None,
            remaining: duration.secs(),
            end_at: None,
            phase: TimerPhase::Idle,
            policy: IntervalPolicy::default(),
            dispatcher,
            liveness,
            permission: PermissionGate::default(),
            run_generation: 0,
            last_signalled: None,
        }
    }

    pub fn with_toggles(mut self, toggles: IntervalToggles) -> Self {
        self.policy = IntervalPolicy::new(toggles);
        self
    }

    pub fn with_permission(mut self, permission: PermissionGate) -> Self {
        self.permission = permission;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn duration(&self) -> TimerDuration {
        self.duration
    }

    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        self.end_at
    }

    pub fn toggles(&self) -> IntervalToggles {
        self.policy.toggles()
    }

    pub fn run_generation(&self) -> u64 {
        self.run_generation
    }

    pub fn capabilities(&self) -> ChannelCapabilities {
        self.dispatcher.capabilities()
    }

    pub fn liveness(&self) -> &LivenessSession {
        &self.liveness
    }

    pub fn permission(&self) -> PermissionGate {
        self.permission
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_at(Utc::now())
    }

    /// Remaining whole seconds as observed at `now`.
    ///
    /// A partly elapsed second still counts, so zero is only reached at
    /// `end_at` itself.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        match (self.phase, self.end_at) {
            (TimerPhase::Running, Some(end_at)) => seconds_until(end_at, now),
            _ => self.remaining,
        }
    }

    /// Label for the primary button.
    pub fn start_label_at(&self, now: DateTime<Utc>) -> &'static str {
        if self.phase == TimerPhase::Running {
            return "Pause";
        }
        let remaining = self.remaining_at(now);
        if remaining > 0 && remaining < self.duration.secs() {
            "Resume"
        } else {
            "Start"
        }
    }

    pub fn start_label(&self) -> &'static str {
        self.start_label_at(Utc::now())
    }

    /// The view swaps start/stop for a single reset button at zero.
    pub fn show_reset_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_at(now) == 0
    }

    /// Build a full state snapshot event.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            remaining_secs: self.remaining_at(now),
            duration_secs: self.duration.secs(),
            start_label: self.start_label_at(now).to_string(),
            show_reset: self.show_reset_at(now),
            at: now,
        }
    }

    pub fn snapshot(&self) -> Event {
        self.snapshot_at(Utc::now())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        self.start_at(Utc::now())
    }

    /// Start from Idle, or resume from Paused keeping `remaining`.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let resuming = match self.phase {
            TimerPhase::Idle => false,
            TimerPhase::Paused => true,
            TimerPhase::Running | TimerPhase::Finished => return Vec::new(),
        };
        if self.remaining == 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.dispatcher.capabilities().notifications && self.permission.take_explanation_request()
        {
            events.push(Event::PermissionExplanationRequested { at: now });
        }

        let end_at = now + Duration::seconds(i64::from(self.remaining));
        self.end_at = Some(end_at);
        self.phase = TimerPhase::Running;
        self.run_generation += 1;
        self.last_signalled = None;
        info!(remaining = self.remaining, resuming, "countdown running");

        events.push(if resuming {
            Event::TimerResumed {
                remaining_secs: self.remaining,
                end_at,
                at: now,
            }
        } else {
            Event::TimerStarted {
                remaining_secs: self.remaining,
                end_at,
                at: now,
            }
        });

        if self.liveness.acquire().is_err() {
            events.push(Event::LivenessLost {
                reason: "acquisition refused".to_string(),
                at: now,
            });
            self.fall_back(self.remaining, now, &mut events);
        }
        events
    }

    pub fn pause(&mut self) -> Vec<Event> {
        self.pause_at(Utc::now())
    }

    /// No-op unless running. Pausing at zero finishes instead.
    pub fn pause_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }
        let remaining = self.remaining_at(now);
        if remaining == 0 {
            return self.finish(now);
        }

        let mut events = Vec::new();
        self.remaining = remaining;
        self.phase = TimerPhase::Paused;
        self.leave_running(now, &mut events);
        info!(remaining, "countdown paused");
        events.push(Event::TimerPaused {
            remaining_secs: remaining,
            at: now,
        });
        events
    }

    /// Primary button: pause when running, otherwise start/resume.
    pub fn toggle_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase == TimerPhase::Running {
            self.pause_at(now)
        } else {
            self.start_at(now)
        }
    }

    pub fn stop(&mut self) -> Vec<Event> {
        self.stop_at(Utc::now())
    }

    /// Return to Idle with the configured duration. No-op when Idle.
    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase == TimerPhase::Idle {
            return Vec::new();
        }

        let mut events = Vec::new();
        let was_running = self.phase == TimerPhase::Running;
        self.phase = TimerPhase::Idle;
        if was_running {
            self.leave_running(now, &mut events);
        }
        if let Some(pending) = self.pending_duration.take() {
            self.duration = pending;
        }
        self.remaining = self.duration.secs();
        info!(remaining = self.remaining, "countdown reset");
        events.push(Event::TimerReset {
            remaining_secs: self.remaining,
            at: now,
        });
        events
    }

    pub fn reset(&mut self) -> Vec<Event> {
        self.stop()
    }

    pub fn reset_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.stop_at(now)
    }

    /// Change the configured duration.
    ///
    /// When not running, `remaining` follows immediately and the clock goes
    /// back to Idle. While running the value is held until the next
    /// stop/reset.
    pub fn set_duration_at(
        &mut self,
        secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, ValidationError> {
        let duration = TimerDuration::new(secs)?;

        if self.phase == TimerPhase::Running {
            self.pending_duration = Some(duration);
            return Ok(vec![Event::DurationChanged {
                duration_secs: duration.secs(),
                applied: false,
                at: now,
            }]);
        }

        self.duration = duration;
        self.pending_duration = None;
        self.remaining = duration.secs();
        self.phase = TimerPhase::Idle;
        Ok(vec![Event::DurationChanged {
            duration_secs: duration.secs(),
            applied: true,
            at: now,
        }])
    }

    pub fn set_duration(&mut self, secs: u64) -> Result<Vec<Event>, ValidationError> {
        self.set_duration_at(secs, Utc::now())
    }

    /// Interval toggles are consulted on every tick; changes apply at once.
    pub fn set_toggles(&mut self, toggles: IntervalToggles) {
        self.policy = IntervalPolicy::new(toggles);
    }

    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_at(Utc::now())
    }

    /// Observe the clock at `now`: publish the remaining time, fire any
    /// interval feedback, or finish.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }

        let remaining = self.remaining_at(now);
        if remaining == 0 {
            return self.finish(now);
        }

        self.remaining = remaining;
        if self.last_signalled == Some(remaining) {
            return Vec::new();
        }
        self.last_signalled = Some(remaining);

        let tiers = self.policy.tiers_for(remaining);
        debug!(remaining, ?tiers, "tick");
        let mut events = vec![Event::Tick {
            remaining_secs: remaining,
            tiers: tiers.clone(),
            at: now,
        }];
        for tier in tiers {
            self.dispatch(tier, now, &mut events);
        }
        events
    }

    /// Tick scheduled for run `generation`. Ignored if that run is over.
    pub fn tick_for(&mut self, generation: u64, now: DateTime<Utc>) -> Vec<Event> {
        if generation != self.run_generation {
            debug!(generation, current = self.run_generation, "dropping stale tick");
            return Vec::new();
        }
        self.tick_at(now)
    }

    /// Apply a platform liveness callback.
    pub fn handle_liveness_at(&mut self, event: LivenessEvent, now: DateTime<Utc>) -> Vec<Event> {
        match event {
            LivenessEvent::Expiring { generation } => {
                if self.liveness.on_expiring(generation) {
                    vec![Event::LivenessExpiring { at: now }]
                } else {
                    Vec::new()
                }
            }
            LivenessEvent::Invalidated { generation, reason } => {
                let running = self.phase == TimerPhase::Running;
                match self.liveness.on_invalidated(generation, &reason, running) {
                    InvalidationOutcome::Stale | InvalidationOutcome::NotRunning => Vec::new(),
                    InvalidationOutcome::Recovered => vec![Event::LivenessRecovered { at: now }],
                    InvalidationOutcome::Lost => {
                        let mut events = vec![Event::LivenessLost {
                            reason: reason.to_string(),
                            at: now,
                        }];
                        let remaining = self.remaining_at(now);
                        self.fall_back(remaining, now, &mut events);
                        events
                    }
                }
            }
        }
    }

    pub fn handle_liveness(&mut self, event: LivenessEvent) -> Vec<Event> {
        self.handle_liveness_at(event, Utc::now())
    }

    /// The user accepted the permission explanation.
    pub fn confirm_permission_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let channel = self.dispatcher.notifications();
        let status = self.permission.confirm(channel.as_deref());
        vec![Event::PermissionResolved { status, at: now }]
    }

    pub fn confirm_permission(&mut self) -> Vec<Event> {
        self.confirm_permission_at(Utc::now())
    }

    /// The user cancelled the permission explanation.
    pub fn decline_permission_at(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let status = self.permission.decline();
        vec![Event::PermissionResolved { status, at: now }]
    }

    pub fn decline_permission(&mut self) -> Vec<Event> {
        self.decline_permission_at(Utc::now())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        self.remaining = 0;
        self.phase = TimerPhase::Finished;
        self.leave_running(now, &mut events);
        info!("countdown finished");
        events.push(Event::TimerFinished { at: now });
        self.dispatch(FeedbackTier::Finished, now, &mut events);
        events
    }

    /// Stop ticking and release liveness. Pending fallback notifications
    /// are cancelled with the session.
    fn leave_running(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) {
        self.end_at = None;
        self.run_generation += 1;
        self.last_signalled = None;
        let cancelled = self.liveness.pending_fallback().len();
        self.liveness.release();
        if cancelled > 0 {
            events.push(Event::FallbackCancelled {
                count: cancelled,
                at: now,
            });
        }
    }

    fn dispatch(&self, tier: FeedbackTier, now: DateTime<Utc>, events: &mut Vec<Event>) {
        match self.dispatcher.deliver(tier) {
            DeliveryResult::Delivered(channel) => events.push(Event::FeedbackDelivered {
                tier,
                channel,
                at: now,
            }),
            DeliveryResult::Failed => events.push(Event::FeedbackUnavailable { tier, at: now }),
        }
    }

    fn fall_back(&mut self, remaining: u32, now: DateTime<Utc>, events: &mut Vec<Event>) {
        let permission = self.permission.status();
        match self
            .liveness
            .schedule_fallback(remaining, self.policy.toggles(), permission)
        {
            Ok(count) => events.push(Event::FallbackScheduled { count, at: now }),
            Err(e) => {
                match permission {
                    PermissionStatus::Denied => {
                        debug!("fallback skipped: notification permission denied")
                    }
                    PermissionStatus::NotDetermined => {
                        debug!("fallback skipped: notification permission not answered yet")
                    }
                    PermissionStatus::Granted => {
                        warn!(error = %e, "fallback notifications unavailable")
                    }
                }
                events.push(Event::FallbackUnavailable {
                    reason: e.to_string(),
                    at: now,
                });
            }
        }
    }
}

impl std::fmt::Debug for CountdownClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownClock")
            .field("phase", &self.phase)
            .field("remaining", &self.remaining)
            .field("end_at", &self.end_at)
            .field("duration", &self.duration)
            .field("run_generation", &self.run_generation)
            .finish()
    }
}

/// Whole seconds from `now` until `end_at`, rounding partial seconds up.
///
/// Rounding up is deliberate: a truncating `floor` would show 0 for the whole
/// last second and report one second less after every late tick. With
/// ceiling, zero lands exactly at `end_at` and a late tick still sees the
/// second it is in.
fn seconds_until(end_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let ms = (end_at - now).num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    u32::try_from((ms + 999) / 1000).unwrap_or(u32::MAX)
}
