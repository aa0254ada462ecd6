//! Interval toggles and the tier-matching policy.
//!
//! For every observed remaining-seconds value the policy picks at most one
//! [`FeedbackTier`]. Boundaries are checked in fixed priority order
//! (60 > 10 > 5 > 1), first match wins. The final second always fires,
//! whatever the toggles say.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A user-selectable feedback interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalTag {
    EverySecond,
    #[serde(rename = "every_5s")]
    Every5s,
    #[serde(rename = "every_10s")]
    Every10s,
    #[serde(rename = "every_60s")]
    Every60s,
}

impl IntervalTag {
    /// All tags, longest interval first.
    pub const ALL: [IntervalTag; 4] = [
        IntervalTag::Every60s,
        IntervalTag::Every10s,
        IntervalTag::Every5s,
        IntervalTag::EverySecond,
    ];

    pub fn seconds(self) -> u32 {
        match self {
            IntervalTag::EverySecond => 1,
            IntervalTag::Every5s => 5,
            IntervalTag::Every10s => 10,
            IntervalTag::Every60s => 60,
        }
    }

    /// Key used in the `[intervals]` config table.
    pub fn key(self) -> &'static str {
        match self {
            IntervalTag::EverySecond => "every_second",
            IntervalTag::Every5s => "every_5s",
            IntervalTag::Every10s => "every_10s",
            IntervalTag::Every60s => "every_60s",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            IntervalTag::EverySecond => "1 Second",
            IntervalTag::Every5s => "5 Seconds",
            IntervalTag::Every10s => "10 Seconds",
            IntervalTag::Every60s => "1 Minute",
        }
    }
}

impl fmt::Display for IntervalTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for IntervalTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every_second" | "everysecond" | "1" | "1s" => Ok(IntervalTag::EverySecond),
            "every_5s" | "every5s" | "5" | "5s" => Ok(IntervalTag::Every5s),
            "every_10s" | "every10s" | "10" | "10s" => Ok(IntervalTag::Every10s),
            "every_60s" | "every60s" | "60" | "60s" | "1m" => Ok(IntervalTag::Every60s),
            other => Err(ValidationError::UnknownInterval(other.to_string())),
        }
    }
}

/// Which intervals the user wants feedback for. Every flag defaults to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalToggles {
    #[serde(default = "default_true")]
    pub every_second: bool,
    #[serde(default = "default_true")]
    pub every_5s: bool,
    #[serde(default = "default_true")]
    pub every_10s: bool,
    #[serde(default = "default_true")]
    pub every_60s: bool,
}

fn default_true() -> bool {
    true
}

impl Default for IntervalToggles {
    fn default() -> Self {
        Self {
            every_second: true,
            every_5s: true,
            every_10s: true,
            every_60s: true,
        }
    }
}

impl IntervalToggles {
    /// Everything off. Only the final second still fires.
    pub fn none() -> Self {
        Self {
            every_second: false,
            every_5s: false,
            every_10s: false,
            every_60s: false,
        }
    }

    pub fn is_enabled(&self, tag: IntervalTag) -> bool {
        match tag {
            IntervalTag::EverySecond => self.every_second,
            IntervalTag::Every5s => self.every_5s,
            IntervalTag::Every10s => self.every_10s,
            IntervalTag::Every60s => self.every_60s,
        }
    }

    pub fn set(&mut self, tag: IntervalTag, enabled: bool) {
        match tag {
            IntervalTag::EverySecond => self.every_second = enabled,
            IntervalTag::Every5s => self.every_5s = enabled,
            IntervalTag::Every10s => self.every_10s = enabled,
            IntervalTag::Every60s => self.every_60s = enabled,
        }
    }

    pub fn with(mut self, tag: IntervalTag, enabled: bool) -> Self {
        self.set(tag, enabled);
        self
    }
}

/// A named feedback occasion, ordered by intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTier {
    #[serde(rename = "tick_1")]
    Tick1,
    #[serde(rename = "tick_5")]
    Tick5,
    #[serde(rename = "tick_10")]
    Tick10,
    #[serde(rename = "tick_60")]
    Tick60,
    Finished,
}

impl FeedbackTier {
    /// Relative intensity, 1 (lightest) to 5 (completion).
    pub fn rank(self) -> u8 {
        match self {
            FeedbackTier::Tick1 => 1,
            FeedbackTier::Tick5 => 2,
            FeedbackTier::Tick10 => 3,
            FeedbackTier::Tick60 => 4,
            FeedbackTier::Finished => 5,
        }
    }
}

impl fmt::Display for FeedbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedbackTier::Tick1 => "tick_1",
            FeedbackTier::Tick5 => "tick_5",
            FeedbackTier::Tick10 => "tick_10",
            FeedbackTier::Tick60 => "tick_60",
            FeedbackTier::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Maps remaining seconds to the tiers that should fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalPolicy {
    toggles: IntervalToggles,
}

impl IntervalPolicy {
    pub fn new(toggles: IntervalToggles) -> Self {
        Self { toggles }
    }

    pub fn toggles(&self) -> IntervalToggles {
        self.toggles
    }

    /// Tiers to fire with `remaining` seconds left.
    ///
    /// Never called with 0: completion is signalled by the clock itself.
    pub fn tiers_for(&self, remaining: u32) -> Vec<FeedbackTier> {
        self.tier_for(remaining).into_iter().collect()
    }

    /// Single-tier form of [`tiers_for`](Self::tiers_for).
    pub fn tier_for(&self, remaining: u32) -> Option<FeedbackTier> {
        let t = &self.toggles;
        if remaining == 0 {
            None
        } else if remaining == 1 {
            Some(FeedbackTier::Tick1)
        } else if remaining % 60 == 0 && t.every_60s {
            Some(FeedbackTier::Tick60)
        } else if remaining % 10 == 0 && t.every_10s {
            Some(FeedbackTier::Tick10)
        } else if remaining % 5 == 0 && t.every_5s {
            Some(FeedbackTier::Tick5)
        } else if t.every_second {
            Some(FeedbackTier::Tick1)
        } else {
            None
        }
    }
}
