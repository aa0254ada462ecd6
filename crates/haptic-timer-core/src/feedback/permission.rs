//! Notification permission bookkeeping.
//!
//! Before the platform permission prompt is shown for the first time, the
//! user sees an explanation and answers Allow or Cancel. Once answered, the
//! explanation is never requested again; callers persist `explanation_shown`.
//! An explanation left unanswered is requested again in the next session.

use tracing::info;

use super::channel::{NotificationChannel, PermissionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionGate {
    status: PermissionStatus,
    explanation_shown: bool,
    /// Requested in this session, answer still outstanding. Not persisted.
    awaiting_answer: bool,
}

impl PermissionGate {
    pub fn new(status: PermissionStatus, explanation_shown: bool) -> Self {
        Self {
            status,
            explanation_shown,
            awaiting_answer: false,
        }
    }

    pub fn status(&self) -> PermissionStatus {
        self.status
    }

    pub fn explanation_shown(&self) -> bool {
        self.explanation_shown
    }

    pub fn awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }

    /// True when the explanation should be shown now: permission is still
    /// undecided, the user never answered it, and it is not already up.
    pub fn take_explanation_request(&mut self) -> bool {
        if self.status != PermissionStatus::NotDetermined
            || self.explanation_shown
            || self.awaiting_answer
        {
            return false;
        }
        self.awaiting_answer = true;
        true
    }

    fn answered(&mut self) {
        self.explanation_shown = true;
        self.awaiting_answer = false;
    }

    /// The user pressed Allow: ask the platform.
    ///
    /// Without a notification channel the answer is `Denied`. A status that
    /// is already decided is left alone.
    pub fn confirm(&mut self, channel: Option<&dyn NotificationChannel>) -> PermissionStatus {
        if self.status != PermissionStatus::NotDetermined {
            return self.status;
        }
        self.answered();
        self.status = channel
            .map(|c| c.request_permission())
            .unwrap_or(PermissionStatus::Denied);
        info!(status = ?self.status, "notification permission resolved");
        self.status
    }

    /// The user pressed Cancel.
    pub fn decline(&mut self) -> PermissionStatus {
        if self.status == PermissionStatus::NotDetermined {
            self.answered();
            self.status = PermissionStatus::Denied;
            info!("notification permission declined");
        }
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use crate::feedback::ScheduledNotification;

    struct Granting;

    impl NotificationChannel for Granting {
        fn request_permission(&self) -> PermissionStatus {
            PermissionStatus::Granted
        }

        fn schedule(&self, _n: &ScheduledNotification) -> Result<(), ChannelError> {
            Ok(())
        }

        fn cancel(&self, _ids: &[String]) {}
    }

    #[test]
    fn explanation_requested_once_per_session_until_answered() {
        let mut gate = PermissionGate::default();
        assert!(gate.take_explanation_request());
        assert!(!gate.take_explanation_request());
        assert!(gate.awaiting_answer());
        assert!(!gate.explanation_shown());

        gate.decline();
        assert!(gate.explanation_shown());
        assert!(!gate.awaiting_answer());
        assert!(!gate.take_explanation_request());
    }

    #[test]
    fn unanswered_explanation_is_requested_again_next_session() {
        let mut first = PermissionGate::default();
        assert!(first.take_explanation_request());

        // what a caller persists: status and explanation_shown only
        let mut next = PermissionGate::new(first.status(), first.explanation_shown());
        assert!(next.take_explanation_request());
    }

    #[test]
    fn no_explanation_once_decided() {
        let mut gate = PermissionGate::new(PermissionStatus::Denied, false);
        assert!(!gate.take_explanation_request());
    }

    #[test]
    fn confirm_asks_platform() {
        let mut gate = PermissionGate::default();
        assert_eq!(gate.confirm(Some(&Granting)), PermissionStatus::Granted);
        // decided answers stick
        assert_eq!(gate.decline(), PermissionStatus::Granted);
    }

    #[test]
    fn confirm_without_channel_is_denied() {
        let mut gate = PermissionGate::default();
        assert_eq!(gate.confirm(None), PermissionStatus::Denied);
    }
}
