//! Error types for haptic-timer-core, one enum per concern.
//!
//! None of these are fatal to a running countdown: channel and liveness
//! failures degrade feedback, configuration errors are rejected at the
//! input boundary and leave the clock untouched.

use std::path::PathBuf;
use thiserror::Error;

use crate::feedback::ChannelKind;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory could not be determined or created
    #[error("Config directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Countdown duration outside the accepted range
    #[error("Duration {value}s out of range ({min}..={max})")]
    DurationOutOfRange { value: u64, min: u32, max: u32 },

    /// Unknown interval tag
    #[error("Unknown interval '{0}' (expected one of: every_second, every_5s, every_10s, every_60s)")]
    UnknownInterval(String),
}

/// Errors raised when a feedback channel cannot start playback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The device does not offer this channel at all
    #[error("{0} channel is not available on this device")]
    Unsupported(ChannelKind),

    /// Sound resource could not be found
    #[error("Sound resource missing: {0}")]
    ResourceMissing(String),

    /// Output is muted
    #[error("Audio output is muted")]
    Muted,

    /// Playback could not be started
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// User declined notification permission
    #[error("Notification permission denied")]
    PermissionDenied,

    /// Notification permission has not been asked for yet
    #[error("Notification permission not yet granted")]
    PermissionNotDetermined,

    /// Notification could not be scheduled
    #[error("Failed to schedule notification: {0}")]
    ScheduleFailed(String),
}

/// Background liveness errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LivenessError {
    /// The platform refused to grant a keep-alive session
    #[error("Failed to acquire liveness session: {0}")]
    AcquireFailed(String),
}

/// Sound synthesis errors.
#[derive(Error, Debug)]
pub enum SoundError {
    /// WAV encoding failed
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// Output directory could not be created
    #[error("Failed to create sound directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
