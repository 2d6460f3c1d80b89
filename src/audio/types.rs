use std::path::PathBuf;

use rayon::prelude::*;

use crate::error::{AudioError, Result};

/// Immutable block of interleaved PCM frames
///
/// Samples are stored interleaved (`L, R, L, R, ...` for stereo). The buffer
/// never changes after construction; every processing stage returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Build a buffer from interleaved samples
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(AudioError::InvalidParameters {
                details: "channel count must be at least 1".to_string(),
            }
            .into());
        }

        if sample_rate == 0 {
            return Err(AudioError::InvalidParameters {
                details: "sample rate must be positive".to_string(),
            }
            .into());
        }

        if samples.len() % channels as usize != 0 {
            return Err(AudioError::InvalidParameters {
                details: format!(
                    "{} samples do not divide into {} channels",
                    samples.len(),
                    channels
                ),
            }
            .into());
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// All-zero buffer of the given shape
    pub fn silent(frames: usize, channels: u16, sample_rate: u32) -> Result<Self> {
        Self::new(vec![0.0; frames * channels as usize], channels, sample_rate)
    }

    /// Build a buffer from one vector per channel
    pub fn from_channels(channels: &[Vec<f32>], sample_rate: u32) -> Result<Self> {
        let frames = channels.first().map(Vec::len).unwrap_or(0);
        if channels.iter().any(|c| c.len() != frames) {
            return Err(AudioError::InvalidParameters {
                details: "channels have different lengths".to_string(),
            }
            .into());
        }

        let mut samples = Vec::with_capacity(frames * channels.len());
        for frame in 0..frames {
            for channel in channels {
                samples.push(channel[frame]);
            }
        }

        Self::new(samples, channels.len() as u16, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get samples for a specific channel (0-based)
    pub fn channel_samples(&self, channel: usize) -> Vec<f32> {
        if self.channels == 1 || channel >= self.channels as usize {
            return self.samples.clone();
        }

        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Get mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }

    /// Multiply every sample by `gain`, keeping the shape
    pub fn scaled(mut self, gain: f32) -> AudioBuffer {
        self.samples.par_iter_mut().for_each(|s| *s *= gain);
        self
    }

    /// Maximum absolute sample over all frames and channels
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }
}

/// Descriptive metadata about the decoded source file
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    /// Original file path
    pub path: PathBuf,

    /// File name shown in reports
    pub file_name: String,

    /// File size on disk in bytes
    pub size_bytes: u64,

    /// Lower-case extension (wav, mp3, ...)
    pub extension: String,

    /// Bit depth, when the container reports one
    pub bit_depth: Option<u16>,

    /// Codec description for compressed formats
    pub codec: Option<String>,
}

impl FileMetadata {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// A decoded file: samples plus metadata
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub buffer: AudioBuffer,
    pub metadata: FileMetadata,
}
