use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;

use crate::audio::AudioBuffer;
use crate::config::DetectorConfig;
use crate::detection::traits::OnsetDetector;

/// Frames on each side of a candidate used for local statistics
const PEAK_RADIUS: usize = 3;

/// Onset detection from half-wave rectified spectral flux
///
/// The mono mix is cut into Hann-windowed frames, each frame's magnitude
/// spectrum is compared against the previous one and positive differences are
/// summed. Onsets are local maxima of that envelope standing out from their
/// neighbourhood.
#[derive(Debug, Clone)]
pub struct SpectralFluxOnsetDetector {
    window_size: usize,
    hop_size: usize,
    sensitivity: f32,
}

impl SpectralFluxOnsetDetector {
    pub fn new(window_size: usize, hop_size: usize, sensitivity: f32) -> Self {
        Self {
            window_size,
            hop_size,
            sensitivity,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.window_size, config.hop_size, config.sensitivity)
    }

    /// Spectral flux per hop
    pub fn flux_envelope(&self, samples: &[f32]) -> anyhow::Result<Vec<f32>> {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(self.window_size);
        let mut input = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        let hann: Vec<f32> = (0..self.window_size)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (self.window_size - 1) as f32).cos())
            })
            .collect();

        let mut previous = vec![0.0f32; self.window_size / 2 + 1];
        let mut envelope = Vec::new();

        for start in (0..samples.len()).step_by(self.hop_size) {
            let end = (start + self.window_size).min(samples.len());
            let frame = &samples[start..end];

            for (i, slot) in input.iter_mut().enumerate() {
                *slot = frame.get(i).map(|s| s * hann[i]).unwrap_or(0.0);
            }

            fft.process(&mut input, &mut spectrum)
                .map_err(|e| anyhow::anyhow!("FFT processing failed: {}", e))?;

            let flux = spectrum
                .iter()
                .zip(previous.iter_mut())
                .map(|(bin, prev): (&Complex<f32>, &mut f32)| {
                    let magnitude = bin.norm();
                    let rise = (magnitude - *prev).max(0.0);
                    *prev = magnitude;
                    rise
                })
                .sum::<f32>();

            envelope.push(flux);
        }

        Ok(envelope)
    }

    /// Frame indices of envelope peaks
    pub fn pick_peaks(&self, envelope: &[f32]) -> Vec<usize> {
        let mut peaks = Vec::new();

        for (i, &value) in envelope.iter().enumerate() {
            if value <= f32::EPSILON {
                continue;
            }

            let lo = i.saturating_sub(PEAK_RADIUS);
            let hi = (i + PEAK_RADIUS + 1).min(envelope.len());
            let neighbourhood = &envelope[lo..hi];

            let local_max = neighbourhood.iter().fold(0.0f32, |acc, &x| acc.max(x));
            let local_mean = neighbourhood.iter().sum::<f32>() / neighbourhood.len() as f32;
            let threshold = local_mean + self.sensitivity * (local_max - local_mean) * 0.5;

            if value == local_max && value >= threshold && value > local_mean * 1.5 {
                // first of equal maxima wins
                if peaks.last().map_or(true, |&p: &usize| i - p > PEAK_RADIUS) {
                    peaks.push(i);
                }
            }
        }

        if peaks.is_empty() && !envelope.is_empty() {
            let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
            let threshold = mean * (2.0 + self.sensitivity);
            tracing::debug!("No adaptive peaks, falling back to global threshold {:.3}", threshold);

            peaks = envelope
                .iter()
                .enumerate()
                .filter(|(_, &v)| v > threshold && v > f32::EPSILON)
                .map(|(i, _)| i)
                .collect();
        }

        peaks
    }
}

impl OnsetDetector for SpectralFluxOnsetDetector {
    fn name(&self) -> &str {
        "spectral-flux"
    }

    fn description(&self) -> &str {
        "Spectral flux with adaptive local-maximum peak picking"
    }

    fn detect(&self, audio: &AudioBuffer) -> anyhow::Result<Vec<f64>> {
        let mono = audio.mono_samples();
        let envelope = self.flux_envelope(&mono)?;
        let peaks = self.pick_peaks(&envelope);

        tracing::debug!(
            "Spectral flux: {} frames, {} onsets",
            envelope.len(),
            peaks.len()
        );

        let seconds_per_hop = self.hop_size as f64 / audio.sample_rate() as f64;
        Ok(peaks.into_iter().map(|i| i as f64 * seconds_per_hop).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Short noise-like bursts every `period` seconds over silence
    pub(crate) fn click_train(sample_rate: u32, seconds: f64, period: f64) -> AudioBuffer {
        let frames = (sample_rate as f64 * seconds) as usize;
        let period_frames = (sample_rate as f64 * period) as usize;
        let burst = (sample_rate / 100) as usize;

        let samples = (0..frames)
            .map(|i| {
                let offset = i % period_frames;
                if offset < burst {
                    let decay = 1.0 - offset as f32 / burst as f32;
                    decay * if (i * 7919) % 13 < 6 { 0.9 } else { -0.9 }
                } else {
                    0.0
                }
            })
            .collect();

        AudioBuffer::new(samples, 1, sample_rate).unwrap()
    }

    #[test]
    fn test_detects_regular_bursts() {
        let audio = click_train(22050, 4.0, 0.5);
        let detector = SpectralFluxOnsetDetector::new(1024, 256, 0.5);

        let onsets = detector.detect(&audio).unwrap();
        assert!(onsets.len() >= 6 && onsets.len() <= 10, "got {:?}", onsets);

        // each burst begins on a multiple of 0.5s; frames can start up to one window early
        for t in &onsets {
            let phase = t % 0.5;
            assert!(phase < 0.06 || phase > 0.44, "onset {t} off the grid");
        }
    }

    #[test]
    fn test_silence_has_no_onsets() {
        let audio = AudioBuffer::silent(22050, 2, 22050).unwrap();
        let detector = SpectralFluxOnsetDetector::new(1024, 512, 0.5);
        assert!(detector.detect(&audio).unwrap().is_empty());
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let audio = AudioBuffer::new(vec![0.5; 100], 1, 8000).unwrap();
        let detector = SpectralFluxOnsetDetector::new(1024, 512, 0.5);
        let envelope = detector.flux_envelope(audio.samples()).unwrap();
        assert_eq!(envelope.len(), 1);
    }

    #[test]
    fn test_pick_peaks_isolated_maximum() {
        let detector = SpectralFluxOnsetDetector::new(1024, 512, 0.5);
        let envelope = [0.0, 0.1, 0.1, 5.0, 0.1, 0.1, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(detector.pick_peaks(&envelope), vec![3]);
    }
}
