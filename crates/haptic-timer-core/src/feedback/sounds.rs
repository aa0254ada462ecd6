//! Tick sound synthesis.
//!
//! Each tier has its own short tone: a sine with its 2nd and 3rd harmonics,
//! shaped by a 10 ms linear attack and release. Lower pitch and longer
//! duration for the heavier tiers.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SoundError;
use crate::feedback::channel::SoundCue;
use crate::interval::FeedbackTier;

pub const SAMPLE_RATE: u32 = 44_100;
const RAMP_SECS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundSpec {
    pub tier: FeedbackTier,
    pub frequency_hz: f32,
    pub duration_secs: f32,
    pub amplitude: f32,
}

pub const SOUND_SPECS: [SoundSpec; 5] = [
    SoundSpec {
        tier: FeedbackTier::Tick1,
        frequency_hz: 880.0,
        duration_secs: 0.10,
        amplitude: 0.3,
    },
    SoundSpec {
        tier: FeedbackTier::Tick5,
        frequency_hz: 660.0,
        duration_secs: 0.15,
        amplitude: 0.4,
    },
    SoundSpec {
        tier: FeedbackTier::Tick10,
        frequency_hz: 440.0,
        duration_secs: 0.20,
        amplitude: 0.5,
    },
    SoundSpec {
        tier: FeedbackTier::Tick60,
        frequency_hz: 220.0,
        duration_secs: 0.25,
        amplitude: 0.6,
    },
    SoundSpec {
        tier: FeedbackTier::Finished,
        frequency_hz: 440.0,
        duration_secs: 0.30,
        amplitude: 0.7,
    },
];

impl SoundSpec {
    pub fn for_tier(tier: FeedbackTier) -> &'static SoundSpec {
        SOUND_SPECS
            .iter()
            .find(|s| s.tier == tier)
            .unwrap_or(&SOUND_SPECS[0])
    }

    /// File name the audio channel looks up for this tier.
    pub fn file_name(&self) -> &'static str {
        SoundCue::for_tier(self.tier).resource
    }

    pub fn frame_count(&self) -> usize {
        (self.duration_secs * SAMPLE_RATE as f32) as usize
    }

    /// Mono samples in -1.0 ..= 1.0.
    pub fn synthesize(&self) -> Vec<f32> {
        let duration = self.duration_secs;
        (0..self.frame_count())
            .map(|frame| {
                let t = frame as f32 / SAMPLE_RATE as f32;
                let phase = 2.0 * PI * self.frequency_hz * t;
                let tone = (phase.sin() + 0.5 * (2.0 * phase).sin() + 0.25 * (3.0 * phase).sin())
                    / 1.75;
                let envelope = if t < RAMP_SECS {
                    t / RAMP_SECS
                } else if t > duration - RAMP_SECS {
                    ((duration - t) / RAMP_SECS).max(0.0)
                } else {
                    1.0
                };
                tone * envelope * self.amplitude
            })
            .collect()
    }

    /// Write the tone as 16-bit mono PCM.
    pub fn write_wav(&self, path: &Path) -> Result<(), SoundError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let wrap = |source| SoundError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = hound::WavWriter::create(path, spec).map_err(wrap)?;
        for sample in self.synthesize() {
            let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(pcm).map_err(wrap)?;
        }
        writer.finalize().map_err(wrap)
    }
}

/// Write every tier's sound into `dir`, creating it if needed.
pub fn generate_all(dir: &Path) -> Result<Vec<PathBuf>, SoundError> {
    std::fs::create_dir_all(dir).map_err(|source| SoundError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(SOUND_SPECS.len());
    for spec in &SOUND_SPECS {
        let path = dir.join(spec.file_name());
        spec.write_wav(&path)?;
        info!(path = %path.display(), "generated sound");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_starts_and_ends_silent() {
        let spec = SoundSpec::for_tier(FeedbackTier::Tick10);
        let samples = spec.synthesize();
        assert_eq!(samples.len(), spec.frame_count());
        assert_eq!(samples[0], 0.0);
        assert!(samples.last().unwrap().abs() < 0.01);
    }

    #[test]
    fn peak_stays_under_amplitude() {
        let spec = SoundSpec::for_tier(FeedbackTier::Finished);
        let peak = spec
            .synthesize()
            .into_iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= spec.amplitude + f32::EPSILON);
        assert!(peak > spec.amplitude * 0.5);
    }

    #[test]
    fn generate_all_writes_readable_wavs() {
        let dir = tempfile::tempdir().unwrap();
        let written = generate_all(dir.path()).unwrap();
        assert_eq!(written.len(), 5);

        let end = dir.path().join("tick_end.wav");
        let reader = hound::WavReader::open(&end).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len() as usize, SoundSpec::for_tier(FeedbackTier::Finished).frame_count());
    }
}
