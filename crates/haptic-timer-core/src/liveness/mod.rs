//! Background liveness.
//!
//! A [`LivenessProvider`] wraps whatever the platform offers to keep the
//! process from being suspended while a countdown runs. The session tracks
//! one grant at a time. Every acquire and release bumps the session
//! generation; platform callbacks arrive as [`LivenessEvent`]s carrying the
//! generation they were issued for, and anything not matching the current
//! generation is dropped.
//!
//! ```text
//! Inactive -> Acquiring -> Active -> (Expiring) -> Inactive
//! ```

pub mod fallback;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ChannelError, LivenessError};
use crate::feedback::{ChannelKind, NotificationChannel, PermissionStatus};
use crate::interval::IntervalToggles;

/// Opaque platform token for a granted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessHandle(String);

impl LivenessHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

pub trait LivenessProvider: Send + Sync {
    /// Request a keep-alive grant. Later callbacks for this grant must be
    /// reported with the same `generation`.
    fn acquire(&self, generation: u64) -> Result<LivenessHandle, LivenessError>;

    fn release(&self, handle: LivenessHandle);
}

/// Keeps nothing alive beyond the process itself; always grants.
///
/// Suitable for hosts that are never suspended, such as a terminal.
#[derive(Debug, Default)]
pub struct ProcessLiveness;

impl LivenessProvider for ProcessLiveness {
    fn acquire(&self, generation: u64) -> Result<LivenessHandle, LivenessError> {
        Ok(LivenessHandle::new(format!(
            "process-{generation}-{}",
            uuid::Uuid::new_v4()
        )))
    }

    fn release(&self, _handle: LivenessHandle) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessPhase {
    Inactive,
    Acquiring,
    Active,
    Expiring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    Expired,
    ResignedForeground,
    SuppressedBySystem,
    Error(String),
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Expired => f.write_str("expired"),
            InvalidationReason::ResignedForeground => f.write_str("resigned foreground"),
            InvalidationReason::SuppressedBySystem => f.write_str("suppressed by system"),
            InvalidationReason::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Platform callbacks, delivered as messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessEvent {
    Expiring {
        generation: u64,
    },
    Invalidated {
        generation: u64,
        reason: InvalidationReason,
    },
}

/// What the session did with an invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationOutcome {
    /// Callback belonged to an older grant.
    Stale,
    /// The countdown was not running; nothing to recover.
    NotRunning,
    /// The single retry succeeded.
    Recovered,
    /// The retry failed; the caller should fall back to notifications.
    Lost,
}

pub struct LivenessSession {
    provider: Arc<dyn LivenessProvider>,
    notifications: Option<Arc<dyn NotificationChannel>>,
    phase: LivenessPhase,
    handle: Option<LivenessHandle>,
    generation: u64,
    pending: Vec<String>,
    max_pending: usize,
}

impl LivenessSession {
    pub fn new(
        provider: Arc<dyn LivenessProvider>,
        notifications: Option<Arc<dyn NotificationChannel>>,
    ) -> Self {
        Self {
            provider,
            notifications,
            phase: LivenessPhase::Inactive,
            handle: None,
            generation: 0,
            pending: Vec::new(),
            max_pending: fallback::DEFAULT_MAX_PENDING,
        }
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    pub fn phase(&self) -> LivenessPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, LivenessPhase::Active | LivenessPhase::Expiring)
    }

    /// Ids of fallback notifications currently scheduled.
    pub fn pending_fallback(&self) -> &[String] {
        &self.pending
    }

    /// Acquire a fresh grant, dropping any previous one first.
    pub fn acquire(&mut self) -> Result<(), LivenessError> {
        self.drop_handle();
        self.generation += 1;
        self.phase = LivenessPhase::Acquiring;

        match self.provider.acquire(self.generation) {
            Ok(handle) => {
                debug!(generation = self.generation, token = handle.token(), "liveness acquired");
                self.handle = Some(handle);
                self.phase = LivenessPhase::Active;
                Ok(())
            }
            Err(e) => {
                warn!(generation = self.generation, error = %e, "liveness acquisition failed");
                self.phase = LivenessPhase::Inactive;
                Err(e)
            }
        }
    }

    /// Release the grant and cancel any pending fallback.
    ///
    /// Callbacks issued for the released grant become stale.
    pub fn release(&mut self) {
        self.drop_handle();
        self.generation += 1;
        self.phase = LivenessPhase::Inactive;
        self.cancel_fallback();
    }

    /// Returns false when the callback is stale.
    pub fn on_expiring(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.phase != LivenessPhase::Active {
            debug!(generation, current = self.generation, "ignoring stale expiry");
            return false;
        }
        info!(generation, "liveness session expiring");
        self.phase = LivenessPhase::Expiring;
        true
    }

    /// Handle a forced invalidation. Retries the grant exactly once when
    /// `running`.
    pub fn on_invalidated(
        &mut self,
        generation: u64,
        reason: &InvalidationReason,
        running: bool,
    ) -> InvalidationOutcome {
        if generation != self.generation || self.phase == LivenessPhase::Inactive {
            debug!(generation, current = self.generation, "ignoring stale invalidation");
            return InvalidationOutcome::Stale;
        }

        warn!(generation, %reason, "liveness session invalidated");
        // the platform already revoked the handle; nothing to release
        self.handle = None;
        self.phase = LivenessPhase::Inactive;

        if !running {
            return InvalidationOutcome::NotRunning;
        }

        match self.acquire() {
            Ok(()) => InvalidationOutcome::Recovered,
            Err(_) => InvalidationOutcome::Lost,
        }
    }

    /// Replace pending fallback notifications with a fresh plan for
    /// `remaining` seconds. Returns how many were scheduled.
    pub fn schedule_fallback(
        &mut self,
        remaining: u32,
        toggles: IntervalToggles,
        permission: PermissionStatus,
    ) -> Result<usize, ChannelError> {
        self.cancel_fallback();

        let Some(channel) = self.notifications.clone() else {
            return Err(ChannelError::Unsupported(ChannelKind::SystemNotification));
        };
        match permission {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied => return Err(ChannelError::PermissionDenied),
            PermissionStatus::NotDetermined => {
                return Err(ChannelError::PermissionNotDetermined)
            }
        }

        for notification in fallback::plan(remaining, toggles, self.max_pending, self.generation) {
            match channel.schedule(&notification) {
                Ok(()) => self.pending.push(notification.id),
                Err(e) => warn!(id = %notification.id, error = %e, "fallback notification not scheduled"),
            }
        }
        info!(count = self.pending.len(), remaining, "fallback notifications scheduled");
        Ok(self.pending.len())
    }

    /// Cancel every pending fallback notification. Returns how many there were.
    pub fn cancel_fallback(&mut self) -> usize {
        let count = self.pending.len();
        if count == 0 {
            return 0;
        }
        if let Some(channel) = &self.notifications {
            channel.cancel(&self.pending);
        }
        self.pending.clear();
        debug!(count, "fallback notifications cancelled");
        count
    }

    fn drop_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.provider.release(handle);
        }
    }
}

impl std::fmt::Debug for LivenessSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessSession")
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("pending", &self.pending.len())
            .finish()
    }
}
