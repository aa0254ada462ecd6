//! Output channels a device may offer, and what gets sent through them.
//!
//! Every channel method is a "start" call: it hands the work to the
//! platform and returns immediately. Nothing here may block the tick loop.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::interval::FeedbackTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Haptic,
    Audio,
    SystemNotification,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelKind::Haptic => "haptic",
            ChannelKind::Audio => "audio",
            ChannelKind::SystemNotification => "notification",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticIntensity {
    Light,
    Medium,
    Strongest,
}

/// One transient pulse, `offset_ms` after the pattern starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticPulse {
    pub intensity: HapticIntensity,
    pub offset_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticPattern {
    pub pulses: Vec<HapticPulse>,
}

/// Completion is three strongest pulses this far apart.
pub const FINISHED_PULSE_COUNT: u64 = 3;
pub const FINISHED_PULSE_SPACING_MS: u64 = 700;

impl HapticPattern {
    pub fn single(intensity: HapticIntensity) -> Self {
        Self {
            pulses: vec![HapticPulse {
                intensity,
                offset_ms: 0,
            }],
        }
    }

    pub fn for_tier(tier: FeedbackTier) -> Self {
        match tier {
            FeedbackTier::Tick1 | FeedbackTier::Tick5 => Self::single(HapticIntensity::Light),
            FeedbackTier::Tick10 => Self::single(HapticIntensity::Medium),
            FeedbackTier::Tick60 => Self::single(HapticIntensity::Strongest),
            FeedbackTier::Finished => Self {
                pulses: (0..FINISHED_PULSE_COUNT)
                    .map(|i| HapticPulse {
                        intensity: HapticIntensity::Strongest,
                        offset_ms: i * FINISHED_PULSE_SPACING_MS,
                    })
                    .collect(),
            },
        }
    }
}

/// A sound to start, with its playback volume (0.0 .. 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SoundCue {
    pub tier: FeedbackTier,
    pub resource: &'static str,
    pub volume: f32,
}

impl SoundCue {
    pub fn for_tier(tier: FeedbackTier) -> Self {
        let (resource, volume) = match tier {
            FeedbackTier::Tick1 => ("tick_1s.wav", 0.05),
            FeedbackTier::Tick5 => ("tick_5s.wav", 0.10),
            FeedbackTier::Tick10 => ("tick_10s.wav", 0.20),
            FeedbackTier::Tick60 => ("tick_60s.wav", 0.30),
            FeedbackTier::Finished => ("tick_end.wav", 0.40),
        };
        Self {
            tier,
            resource,
            volume,
        }
    }
}

/// Notification permission as last reported by the platform or the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    #[default]
    NotDetermined,
    Granted,
    Denied,
}

/// A one-shot notification delivered `delay_secs` after scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: String,
    pub body: String,
    pub delay_secs: u64,
}

pub trait HapticChannel: Send + Sync {
    /// Queried once when the dispatcher is built.
    fn is_supported(&self) -> bool {
        true
    }

    /// Fire-and-forget. Pulses after the first are scheduled by the device.
    fn play(&self, pattern: &HapticPattern);
}

pub trait AudioChannel: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    /// Start playback. An error means nothing will be heard.
    fn play(&self, cue: &SoundCue) -> Result<(), ChannelError>;
}

pub trait NotificationChannel: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    /// Ask the platform for permission to post notifications.
    fn request_permission(&self) -> PermissionStatus;

    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), ChannelError>;

    /// Cancel pending notifications. Unknown ids are ignored.
    fn cancel(&self, ids: &[String]);
}

/// Which channels the device offered at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelCapabilities {
    pub haptic: bool,
    pub audio: bool,
    pub notifications: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_pattern_repeats_strongest_pulse() {
        let pattern = HapticPattern::for_tier(FeedbackTier::Finished);
        assert_eq!(pattern.pulses.len(), 3);
        assert!(pattern
            .pulses
            .iter()
            .all(|p| p.intensity == HapticIntensity::Strongest));
        assert_eq!(pattern.pulses[1].offset_ms - pattern.pulses[0].offset_ms, 700);
    }

    #[test]
    fn intensity_follows_tier() {
        assert_eq!(
            HapticPattern::for_tier(FeedbackTier::Tick5),
            HapticPattern::single(HapticIntensity::Light)
        );
        assert_eq!(
            HapticPattern::for_tier(FeedbackTier::Tick10),
            HapticPattern::single(HapticIntensity::Medium)
        );
        assert_eq!(
            HapticPattern::for_tier(FeedbackTier::Tick60),
            HapticPattern::single(HapticIntensity::Strongest)
        );
    }

    #[test]
    fn volume_grows_with_rank() {
        let tiers = [
            FeedbackTier::Tick1,
            FeedbackTier::Tick5,
            FeedbackTier::Tick10,
            FeedbackTier::Tick60,
            FeedbackTier::Finished,
        ];
        let volumes: Vec<f32> = tiers.iter().map(|t| SoundCue::for_tier(*t).volume).collect();
        for pair in volumes.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(SoundCue::for_tier(FeedbackTier::Finished).resource, "tick_end.wav");
    }
}
