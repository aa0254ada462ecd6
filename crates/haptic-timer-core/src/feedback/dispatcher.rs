//! Tiered feedback delivery.
//!
//! Haptics first, audio second. When neither can start, the dispatcher
//! returns [`DeliveryResult::Failed`] and the caller must surface it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::channel::{
    AudioChannel, ChannelCapabilities, ChannelKind, HapticChannel, HapticPattern,
    NotificationChannel, SoundCue,
};
use crate::interval::FeedbackTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "channel", rename_all = "snake_case")]
pub enum DeliveryResult {
    Delivered(ChannelKind),
    Failed,
}

impl DeliveryResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryResult::Failed)
    }
}

/// The channels a device hands to the dispatcher.
#[derive(Default, Clone)]
pub struct DeviceChannels {
    pub haptic: Option<Arc<dyn HapticChannel>>,
    pub audio: Option<Arc<dyn AudioChannel>>,
    pub notifications: Option<Arc<dyn NotificationChannel>>,
}

impl DeviceChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_haptic(mut self, channel: Arc<dyn HapticChannel>) -> Self {
        self.haptic = Some(channel);
        self
    }

    pub fn with_audio(mut self, channel: Arc<dyn AudioChannel>) -> Self {
        self.audio = Some(channel);
        self
    }

    pub fn with_notifications(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.notifications = Some(channel);
        self
    }
}

/// Delivers feedback tiers through the best channel the device offers.
///
/// Capabilities are probed once in [`FeedbackDispatcher::new`]; channels
/// reporting no support are dropped for the life of the dispatcher.
pub struct FeedbackDispatcher {
    capabilities: ChannelCapabilities,
    haptic: Option<Arc<dyn HapticChannel>>,
    audio: Option<Arc<dyn AudioChannel>>,
    notifications: Option<Arc<dyn NotificationChannel>>,
}

impl FeedbackDispatcher {
    pub fn new(channels: DeviceChannels) -> Self {
        let haptic = channels.haptic.filter(|c| c.is_supported());
        let audio = channels.audio.filter(|c| c.is_supported());
        let notifications = channels.notifications.filter(|c| c.is_supported());
        let capabilities = ChannelCapabilities {
            haptic: haptic.is_some(),
            audio: audio.is_some(),
            notifications: notifications.is_some(),
        };
        debug!(?capabilities, "feedback channels probed");
        Self {
            capabilities,
            haptic,
            audio,
            notifications,
        }
    }

    /// A dispatcher with no channels. Every delivery fails.
    pub fn silent() -> Self {
        Self::new(DeviceChannels::default())
    }

    pub fn capabilities(&self) -> ChannelCapabilities {
        self.capabilities
    }

    /// Handle used for deferred notifications, if the device has one.
    pub fn notifications(&self) -> Option<Arc<dyn NotificationChannel>> {
        self.notifications.clone()
    }

    pub fn deliver(&self, tier: FeedbackTier) -> DeliveryResult {
        if let Some(haptic) = &self.haptic {
            haptic.play(&HapticPattern::for_tier(tier));
            return DeliveryResult::Delivered(ChannelKind::Haptic);
        }

        let Some(audio) = &self.audio else {
            warn!(%tier, "no haptic or audio channel available");
            return DeliveryResult::Failed;
        };

        let cue = SoundCue::for_tier(tier);
        match audio.play(&cue) {
            Ok(()) => DeliveryResult::Delivered(ChannelKind::Audio),
            Err(e) => {
                warn!(%tier, resource = cue.resource, error = %e, "audio playback failed");
                DeliveryResult::Failed
            }
        }
    }
}

impl std::fmt::Debug for FeedbackDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackDispatcher")
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHaptic {
        supported: bool,
        played: Mutex<Vec<HapticPattern>>,
    }

    impl HapticChannel for RecordingHaptic {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn play(&self, pattern: &HapticPattern) {
            self.played.lock().unwrap().push(pattern.clone());
        }
    }

    struct ScriptedAudio {
        fail_on: Option<FeedbackTier>,
        played: Mutex<Vec<SoundCue>>,
    }

    impl AudioChannel for ScriptedAudio {
        fn play(&self, cue: &SoundCue) -> Result<(), ChannelError> {
            if self.fail_on == Some(cue.tier) {
                return Err(ChannelError::ResourceMissing(cue.resource.into()));
            }
            self.played.lock().unwrap().push(*cue);
            Ok(())
        }
    }

    #[test]
    fn haptic_takes_priority_over_audio() {
        let haptic = Arc::new(RecordingHaptic {
            supported: true,
            ..Default::default()
        });
        let audio = Arc::new(ScriptedAudio {
            fail_on: None,
            played: Mutex::new(Vec::new()),
        });
        let dispatcher = FeedbackDispatcher::new(
            DeviceChannels::new()
                .with_haptic(haptic.clone())
                .with_audio(audio.clone()),
        );

        let result = dispatcher.deliver(FeedbackTier::Tick10);
        assert_eq!(result, DeliveryResult::Delivered(ChannelKind::Haptic));
        assert_eq!(haptic.played.lock().unwrap().len(), 1);
        assert!(audio.played.lock().unwrap().is_empty());
    }

    #[test]
    fn unsupported_haptic_falls_back_to_audio() {
        let haptic = Arc::new(RecordingHaptic::default());
        let audio = Arc::new(ScriptedAudio {
            fail_on: None,
            played: Mutex::new(Vec::new()),
        });
        let dispatcher = FeedbackDispatcher::new(
            DeviceChannels::new()
                .with_haptic(haptic.clone())
                .with_audio(audio.clone()),
        );
        assert!(!dispatcher.capabilities().haptic);

        let result = dispatcher.deliver(FeedbackTier::Tick60);
        assert_eq!(result, DeliveryResult::Delivered(ChannelKind::Audio));
        let played = audio.played.lock().unwrap();
        assert_eq!(played[0].resource, "tick_60s.wav");
        assert!(haptic.played.lock().unwrap().is_empty());
    }

    #[test]
    fn audio_failure_reports_failed() {
        let audio = Arc::new(ScriptedAudio {
            fail_on: Some(FeedbackTier::Finished),
            played: Mutex::new(Vec::new()),
        });
        let dispatcher = FeedbackDispatcher::new(DeviceChannels::new().with_audio(audio));
        assert!(dispatcher.deliver(FeedbackTier::Finished).is_failed());
        assert!(!dispatcher.deliver(FeedbackTier::Tick1).is_failed());
    }

    #[test]
    fn silent_dispatcher_always_fails() {
        let dispatcher = FeedbackDispatcher::silent();
        assert_eq!(dispatcher.capabilities(), ChannelCapabilities::default());
        assert!(dispatcher.deliver(FeedbackTier::Tick5).is_failed());
        assert!(dispatcher.notifications().is_none());
    }
}
