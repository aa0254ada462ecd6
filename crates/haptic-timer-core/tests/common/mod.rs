//! Fake device channels shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use haptic_timer_core::error::{ChannelError, LivenessError};
use haptic_timer_core::feedback::{
    AudioChannel, HapticChannel, HapticPattern, NotificationChannel, PermissionStatus,
    ScheduledNotification, SoundCue,
};
use haptic_timer_core::interval::FeedbackTier;
use haptic_timer_core::liveness::{LivenessHandle, LivenessProvider};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

#[derive(Default)]
pub struct RecordingHaptic {
    pub supported: bool,
    pub played: Mutex<Vec<HapticPattern>>,
}

impl RecordingHaptic {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            supported: true,
            played: Mutex::new(Vec::new()),
        })
    }

    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.played.lock().unwrap().len()
    }
}

impl HapticChannel for RecordingHaptic {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn play(&self, pattern: &HapticPattern) {
        self.played.lock().unwrap().push(pattern.clone());
    }
}

/// Plays everything except the tiers listed in `failing`.
#[derive(Default)]
pub struct ScriptedAudio {
    pub failing: Vec<FeedbackTier>,
    pub played: Mutex<Vec<FeedbackTier>>,
}

impl ScriptedAudio {
    pub fn failing_on(failing: Vec<FeedbackTier>) -> Arc<Self> {
        Arc::new(Self {
            failing,
            played: Mutex::new(Vec::new()),
        })
    }

    pub fn played(&self) -> Vec<FeedbackTier> {
        self.played.lock().unwrap().clone()
    }
}

impl AudioChannel for ScriptedAudio {
    fn play(&self, cue: &SoundCue) -> Result<(), ChannelError> {
        if self.failing.contains(&cue.tier) {
            return Err(ChannelError::ResourceMissing(cue.resource.to_string()));
        }
        self.played.lock().unwrap().push(cue.tier);
        Ok(())
    }
}

pub struct FakeNotifications {
    pub answer: PermissionStatus,
    pub scheduled: Mutex<Vec<ScheduledNotification>>,
    pub cancelled: Mutex<Vec<String>>,
    pub permission_requests: AtomicUsize,
}

impl FakeNotifications {
    pub fn answering(answer: PermissionStatus) -> Arc<Self> {
        Arc::new(Self {
            answer,
            scheduled: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            permission_requests: AtomicUsize::new(0),
        })
    }

    pub fn scheduled(&self) -> Vec<ScheduledNotification> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Ids scheduled and not cancelled since.
    pub fn outstanding(&self) -> Vec<String> {
        let cancelled = self.cancelled();
        self.scheduled()
            .into_iter()
            .map(|n| n.id)
            .filter(|id| !cancelled.contains(id))
            .collect()
    }
}

impl NotificationChannel for FakeNotifications {
    fn request_permission(&self) -> PermissionStatus {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        self.answer
    }

    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), ChannelError> {
        self.scheduled.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn cancel(&self, ids: &[String]) {
        self.cancelled.lock().unwrap().extend(ids.iter().cloned());
    }
}

/// Grants the first `grants` acquisitions, refuses the rest.
pub struct ScriptedLiveness {
    grants: AtomicUsize,
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
}

impl ScriptedLiveness {
    pub fn granting(grants: usize) -> Arc<Self> {
        Arc::new(Self {
            grants: AtomicUsize::new(grants),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        })
    }
}

impl LivenessProvider for ScriptedLiveness {
    fn acquire(&self, generation: u64) -> Result<LivenessHandle, LivenessError> {
        let left = self.grants.load(Ordering::SeqCst);
        if left == 0 {
            return Err(LivenessError::AcquireFailed("no background time left".into()));
        }
        self.grants.store(left - 1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(LivenessHandle::new(format!("scripted-{generation}")))
    }

    fn release(&self, _handle: LivenessHandle) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
