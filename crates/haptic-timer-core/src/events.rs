use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::{ChannelKind, PermissionStatus};
use crate::interval::FeedbackTier;
use crate::timer::TimerPhase;

/// Every state change and user-visible signal is an Event.
/// The view layer consumes them; it never mutates the clock directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        remaining_secs: u32,
        end_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u32,
        end_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerFinished {
        at: DateTime<Utc>,
    },
    /// One observed second while running.
    Tick {
        remaining_secs: u32,
        tiers: Vec<FeedbackTier>,
        at: DateTime<Utc>,
    },
    FeedbackDelivered {
        tier: FeedbackTier,
        channel: ChannelKind,
        at: DateTime<Utc>,
    },
    /// Neither haptic nor audio feedback could be started.
    /// The view must tell the user.
    FeedbackUnavailable {
        tier: FeedbackTier,
        at: DateTime<Utc>,
    },
    DurationChanged {
        duration_secs: u32,
        /// False while running: the value applies on the next stop/reset.
        applied: bool,
        at: DateTime<Utc>,
    },
    LivenessExpiring {
        at: DateTime<Utc>,
    },
    LivenessLost {
        reason: String,
        at: DateTime<Utc>,
    },
    LivenessRecovered {
        at: DateTime<Utc>,
    },
    FallbackScheduled {
        count: usize,
        at: DateTime<Utc>,
    },
    /// Fallback could not be set up (no channel, permission denied).
    FallbackUnavailable {
        reason: String,
        at: DateTime<Utc>,
    },
    FallbackCancelled {
        count: usize,
        at: DateTime<Utc>,
    },
    /// Show the explanation before the first permission prompt. Answer with
    /// `confirm_permission` or `decline_permission`.
    PermissionExplanationRequested {
        at: DateTime<Utc>,
    },
    PermissionResolved {
        status: PermissionStatus,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        remaining_secs: u32,
        duration_secs: u32,
        start_label: String,
        show_reset: bool,
        at: DateTime<Utc>,
    },
}
