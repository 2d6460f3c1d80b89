use rayon::prelude::*;

use crate::audio::AudioBuffer;

/// Peak normalization to a fixed headroom target
pub struct Normalizer {
    target_peak: f32,
}

impl Normalizer {
    pub fn new(target_peak: f32) -> Self {
        Self { target_peak }
    }

    pub fn target_peak(&self) -> f32 {
        self.target_peak
    }

    /// Scale so that `max |sample| == target_peak`.
    ///
    /// A silent buffer is returned unchanged.
    pub fn normalize(&self, buffer: AudioBuffer) -> AudioBuffer {
        let peak = buffer
            .samples()
            .par_iter()
            .map(|s| s.abs())
            .reduce(|| 0.0f32, f32::max);

        if !(peak > 0.0) || !peak.is_finite() {
            tracing::debug!("Skipping normalization, peak = {}", peak);
            return buffer;
        }

        buffer.scaled(self.target_peak / peak)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(super::TARGET_PEAK)
    }
}
