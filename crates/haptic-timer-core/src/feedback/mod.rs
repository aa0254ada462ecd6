//! Feedback channels and tiered delivery.

mod channel;
mod dispatcher;
mod permission;
pub mod sounds;

pub use channel::{
    AudioChannel, ChannelCapabilities, ChannelKind, HapticChannel, HapticIntensity,
    HapticPattern, HapticPulse, NotificationChannel, PermissionStatus, ScheduledNotification,
    SoundCue, FINISHED_PULSE_COUNT, FINISHED_PULSE_SPACING_MS,
};
pub use dispatcher::{DeliveryResult, DeviceChannels, FeedbackDispatcher};
pub use permission::PermissionGate;
