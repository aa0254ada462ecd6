use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Configured countdown length in whole seconds, 1..=3600.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u32")]
pub struct TimerDuration(u32);

impl TimerDuration {
    pub const MIN_SECS: u32 = 1;
    pub const MAX_SECS: u32 = 3600;

    pub fn new(secs: u64) -> Result<Self, ValidationError> {
        if secs < u64::from(Self::MIN_SECS) || secs > u64::from(Self::MAX_SECS) {
            return Err(ValidationError::DurationOutOfRange {
                value: secs,
                min: Self::MIN_SECS,
                max: Self::MAX_SECS,
            });
        }
        Ok(Self(secs as u32))
    }

    pub fn secs(self) -> u32 {
        self.0
    }
}

impl Default for TimerDuration {
    fn default() -> Self {
        Self(60)
    }
}

impl TryFrom<u64> for TimerDuration {
    type Error = ValidationError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::new(secs)
    }
}

impl From<TimerDuration> for u32 {
    fn from(d: TimerDuration) -> Self {
        d.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_range_bounds() {
        assert_eq!(TimerDuration::new(1).unwrap().secs(), 1);
        assert_eq!(TimerDuration::new(3600).unwrap().secs(), 3600);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            TimerDuration::new(0),
            Err(ValidationError::DurationOutOfRange { value: 0, .. })
        ));
        assert!(TimerDuration::new(3601).is_err());
    }
}
