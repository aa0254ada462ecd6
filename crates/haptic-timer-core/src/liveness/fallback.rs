//! Deferred notifications that stand in for live feedback while the
//! process may be suspended.

use crate::feedback::ScheduledNotification;
use crate::interval::{IntervalPolicy, IntervalToggles};

pub const FINISHED_BODY: &str = "Timer finished!";

/// Default cap on pending fallback notifications.
pub const DEFAULT_MAX_PENDING: usize = 64;

pub fn boundary_body(seconds: u32) -> String {
    if seconds == 1 {
        "1 second remaining".to_string()
    } else {
        format!("{seconds} seconds remaining")
    }
}

/// Notifications covering every enabled boundary ahead of `remaining`,
/// soonest first, followed by the terminal one.
///
/// At most `max_pending` entries are returned. The terminal notification is
/// always present; when the cap bites, the boundaries furthest away are the
/// ones dropped.
pub fn plan(
    remaining: u32,
    toggles: IntervalToggles,
    max_pending: usize,
    generation: u64,
) -> Vec<ScheduledNotification> {
    if remaining == 0 {
        return Vec::new();
    }

    let policy = IntervalPolicy::new(toggles);
    let boundary_slots = max_pending.max(1) - 1;

    let mut out: Vec<ScheduledNotification> = (1..remaining)
        .rev()
        .filter(|b| policy.tier_for(*b).is_some())
        .take(boundary_slots)
        .map(|b| ScheduledNotification {
            id: format!("haptic-timer.{generation}.{b}"),
            body: boundary_body(b),
            delay_secs: u64::from(remaining - b),
        })
        .collect();

    out.push(ScheduledNotification {
        id: format!("haptic-timer.{generation}.finished"),
        body: FINISHED_BODY.to_string(),
        delay_secs: u64::from(remaining),
    });
    out
}
