//! # Haptic Timer Core Library
//!
//! Countdown timer that signals time passing through haptic pulses, with
//! short sounds as a fallback and scheduled system notifications when the
//! process may be suspended. The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: A wall-clock-based state machine ([`CountdownClock`]) plus an
//!   async [`TimerDriver`] that feeds it commands, ticks and liveness callbacks
//! - **Intervals**: Which remaining-seconds values produce feedback, and at
//!   which tier
//! - **Feedback**: Platform channels behind traits, routed by a
//!   [`FeedbackDispatcher`] that probes capabilities once
//! - **Liveness**: Background keep-alive and the notification fallback plan
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CountdownClock`]: Core timer state machine
//! - [`IntervalPolicy`]: Tier matching for remaining seconds
//! - [`LivenessSession`]: Keep-alive lifecycle and fallback scheduling
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod feedback;
pub mod interval;
pub mod liveness;
pub mod storage;
pub mod timer;

pub use error::{ChannelError, ConfigError, LivenessError, SoundError, ValidationError};
pub use events::Event;
pub use feedback::{
    AudioChannel, ChannelKind, DeliveryResult, DeviceChannels, FeedbackDispatcher, HapticChannel,
    HapticPattern, NotificationChannel, PermissionGate, PermissionStatus, ScheduledNotification,
    SoundCue,
};
pub use interval::{FeedbackTier, IntervalPolicy, IntervalTag, IntervalToggles};
pub use liveness::{
    InvalidationOutcome, InvalidationReason, LivenessEvent, LivenessHandle, LivenessPhase,
    LivenessProvider, LivenessSession, ProcessLiveness,
};
pub use storage::Config;
pub use timer::{Command, CountdownClock, TimeSource, TimerDriver, TimerDuration, TimerPhase};
