//! Feedback channels available to a terminal session.
//!
//! A terminal has no haptics. Audio is the terminal bell, and notifications
//! are tokio tasks that print their body to stderr when due.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use haptic_timer_core::error::ChannelError;
use haptic_timer_core::feedback::{
    AudioChannel, DeviceChannels, NotificationChannel, PermissionStatus, ScheduledNotification,
    SoundCue,
};
use haptic_timer_core::Config;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::debug;

pub struct TerminalBell {
    muted: bool,
    sounds_dir: Option<PathBuf>,
}

impl TerminalBell {
    pub fn new(muted: bool, sounds_dir: Option<PathBuf>) -> Self {
        Self { muted, sounds_dir }
    }
}

impl AudioChannel for TerminalBell {
    fn play(&self, cue: &SoundCue) -> Result<(), ChannelError> {
        if self.muted {
            return Err(ChannelError::Muted);
        }
        if let Some(dir) = &self.sounds_dir {
            let path = dir.join(cue.resource);
            if !path.is_file() {
                return Err(ChannelError::ResourceMissing(path.display().to_string()));
            }
        }
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| ChannelError::PlaybackFailed(e.to_string()))
    }
}

/// Notifications printed to stderr after their delay.
pub struct TerminalNotifications {
    runtime: Handle,
    pending: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl TerminalNotifications {
    /// Must be called from inside a tokio runtime.
    pub fn new() -> Self {
        Self {
            runtime: Handle::current(),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl NotificationChannel for TerminalNotifications {
    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), ChannelError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| ChannelError::ScheduleFailed(e.to_string()))?;

        let id = notification.id.clone();
        let body = notification.body.clone();
        let delay = Duration::from_secs(notification.delay_secs);
        let registry = Arc::clone(&self.pending);
        let task_id = id.clone();
        let handle = self.runtime.spawn(async move {
            sleep(delay).await;
            eprintln!("notification: {body}");
            if let Ok(mut pending) = registry.lock() {
                pending.remove(&task_id);
            }
        });

        if let Some(previous) = pending.insert(id, handle) {
            previous.abort();
        }
        Ok(())
    }

    fn cancel(&self, ids: &[String]) {
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        for id in ids {
            if let Some(handle) = pending.remove(id) {
                handle.abort();
            }
        }
        debug!(count = ids.len(), "terminal notifications cancelled");
    }
}

/// Channels for a terminal session, narrowed by the feedback and
/// notification settings.
pub fn from_config(config: &Config) -> DeviceChannels {
    let sounds_dir = config.feedback.sounds_dir.as_ref().map(PathBuf::from);
    let channels = DeviceChannels::new()
        .with_audio(Arc::new(TerminalBell::new(config.feedback.muted, sounds_dir)))
        .with_notifications(Arc::new(TerminalNotifications::new()));
    config.filter_channels(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use haptic_timer_core::interval::FeedbackTier;

    #[test]
    fn muted_bell_fails() {
        let bell = TerminalBell::new(true, None);
        assert_eq!(
            bell.play(&SoundCue::for_tier(FeedbackTier::Tick1)),
            Err(ChannelError::Muted)
        );
    }

    #[test]
    fn bell_requires_cue_file_when_dir_is_set() {
        let dir = std::env::temp_dir().join(format!("haptic-timer-bell-{}", std::process::id()));
        let bell = TerminalBell::new(false, Some(dir));
        assert!(matches!(
            bell.play(&SoundCue::for_tier(FeedbackTier::Finished)),
            Err(ChannelError::ResourceMissing(_))
        ));
    }

    #[tokio::test]
    async fn disabled_notifications_are_not_offered() {
        let mut config = Config::default();
        assert!(from_config(&config).notifications.is_some());
        config.notifications.enabled = false;
        let channels = from_config(&config);
        assert!(channels.notifications.is_none());
        assert!(channels.audio.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_notification_never_fires() {
        let channel = TerminalNotifications::new();
        let notification = ScheduledNotification {
            id: "haptic-timer.1.finished".into(),
            body: "Timer finished!".into(),
            delay_secs: 5,
        };
        channel.schedule(&notification).unwrap();
        assert_eq!(channel.pending.lock().unwrap().len(), 1);

        channel.cancel(&[notification.id.clone()]);
        assert!(channel.pending.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn due_notification_leaves_registry() {
        let channel = TerminalNotifications::new();
        channel
            .schedule(&ScheduledNotification {
                id: "haptic-timer.1.5".into(),
                body: "5 seconds remaining".into(),
                delay_secs: 1,
            })
            .unwrap();
        sleep(Duration::from_secs(2)).await;
        assert!(channel.pending.lock().unwrap().is_empty());
    }
}
