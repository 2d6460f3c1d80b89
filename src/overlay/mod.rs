//! # Click-Track Overlays
//!
//! Turns detected events into audible verification tracks:
//!
//! 1. [`ClickSynthesizer`] renders a mono burst track per event set
//! 2. [`ChannelMixer`] broadcasts each track to every source channel and sums
//! 3. [`Normalizer`] rescales the mix to a fixed peak
//!
//! Beats and downbeats share one overlay (two click layers), onsets get
//! their own.

pub mod click;
pub mod mixer;
pub mod normalize;

use std::path::{Path, PathBuf};

pub use click::{ClickSpec, ClickSynthesizer};
pub use mixer::{ChannelMixer, ClickLayer};
pub use normalize::Normalizer;

use crate::{audio::AudioBuffer, config::ClickConfig, detection::EventSet, error::Result};

/// Peak level of every rendered overlay
pub const TARGET_PEAK: f32 = 0.8;

/// Which overlay file a buffer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Beats and downbeats
    Beats,
    Onsets,
}

impl OverlayKind {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Beats => "beats",
            Self::Onsets => "onsets",
        }
    }

    /// `<dir>/<prefix>_<unix seconds>.wav`
    ///
    /// Two runs in the same second produce the same name.
    pub fn destination(&self, dir: &Path, unix_seconds: i64) -> PathBuf {
        dir.join(format!("{}_{}.wav", self.file_prefix(), unix_seconds))
    }
}

/// A rendered overlay and where it was written
#[derive(Debug, Clone)]
pub struct OverlayOutput {
    pub kind: OverlayKind,
    pub buffer: AudioBuffer,
    pub destination: PathBuf,
}

/// Renders overlays with the configured click sounds
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    clicks: ClickConfig,
}

impl OverlayRenderer {
    pub fn new(clicks: ClickConfig) -> Self {
        Self { clicks }
    }

    /// Beat clicks and downbeat clicks mixed into one buffer
    pub fn render_beats(&self, source: &AudioBuffer, beats: &EventSet, downbeats: &EventSet) -> Result<AudioBuffer> {
        self.render(source, &[(beats, self.clicks.beat), (downbeats, self.clicks.downbeat)])
    }

    pub fn render_onsets(&self, source: &AudioBuffer, onsets: &EventSet) -> Result<AudioBuffer> {
        self.render(source, &[(onsets, self.clicks.onset)])
    }

    fn render(&self, source: &AudioBuffer, layers: &[(&EventSet, ClickSpec)]) -> Result<AudioBuffer> {
        let frames = source.frames();
        let layers: Vec<ClickLayer> = layers
            .iter()
            .map(|(events, spec)| {
                let synth = ClickSynthesizer::new(*spec, source.sample_rate());
                ClickLayer::new(synth.render(events, frames), spec.weight)
            })
            .collect();

        let mixed = ChannelMixer::mix(source, &layers)?;
        Ok(Normalizer::new(self.clicks.target_peak).normalize(mixed))
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(ClickConfig::default())
    }
}
