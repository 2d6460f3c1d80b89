use crate::audio::AudioBuffer;
use crate::config::DetectorConfig;
use crate::detection::traits::OnsetDetector;

/// Onset detection from peaks of the RMS energy envelope
///
/// Cheaper than spectral flux and works well on percussive material, but
/// misses soft note changes.
#[derive(Debug, Clone)]
pub struct EnergyOnsetDetector {
    window_size: usize,
    hop_size: usize,
    /// Minimum spacing between onsets in seconds
    min_interval: f64,
}

impl EnergyOnsetDetector {
    pub fn new(window_size: usize, hop_size: usize, min_interval: f64) -> Self {
        Self {
            window_size,
            hop_size,
            min_interval,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.window_size, config.hop_size, 0.05)
    }

    /// RMS per hop
    pub fn rms_envelope(&self, samples: &[f32]) -> Vec<f32> {
        (0..samples.len())
            .step_by(self.hop_size)
            .map(|start| {
                let window = &samples[start..(start + self.window_size).min(samples.len())];
                (window.iter().map(|&x| x * x).sum::<f32>() / window.len() as f32).sqrt()
            })
            .collect()
    }
}

impl OnsetDetector for EnergyOnsetDetector {
    fn name(&self) -> &str {
        "energy"
    }

    fn description(&self) -> &str {
        "RMS energy envelope peaks"
    }

    fn detect(&self, audio: &AudioBuffer) -> anyhow::Result<Vec<f64>> {
        let envelope = self.rms_envelope(&audio.mono_samples());
        if envelope.is_empty() {
            return Ok(Vec::new());
        }

        let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
        let max = envelope.iter().fold(0.0f32, |acc, &x| acc.max(x));
        let threshold = mean + (max - mean) * 0.3;

        tracing::debug!(
            "Energy envelope: mean={:.3}, max={:.3}, threshold={:.3}",
            mean,
            max,
            threshold
        );

        let seconds_per_hop = self.hop_size as f64 / audio.sample_rate() as f64;
        let mut onsets = Vec::new();
        let mut last = f64::NEG_INFINITY;

        for (i, &rms) in envelope.iter().enumerate() {
            if rms <= threshold || rms <= f32::EPSILON {
                continue;
            }

            let lo = i.saturating_sub(2);
            let hi = (i + 3).min(envelope.len());
            let is_local_max = envelope[lo..hi].iter().all(|&e| e <= rms);
            let time = i as f64 * seconds_per_hop;

            if is_local_max && time - last >= self.min_interval {
                onsets.push(time);
                last = time;
            }
        }

        Ok(onsets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_loud_sections() {
        let sample_rate = 8000;
        let mut samples = vec![0.0f32; sample_rate * 2];
        for start in [2000, 10000] {
            for s in &mut samples[start..start + 400] {
                *s = 0.8;
            }
        }
        let audio = AudioBuffer::new(samples, 1, sample_rate as u32).unwrap();

        let onsets = EnergyOnsetDetector::new(256, 128, 0.05).detect(&audio).unwrap();
        assert_eq!(onsets.len(), 2, "got {:?}", onsets);
        assert!((onsets[0] - 0.25).abs() < 0.05);
        assert!((onsets[1] - 1.25).abs() < 0.05);
    }

    #[test]
    fn test_silence_yields_nothing() {
        let audio = AudioBuffer::silent(8000, 1, 8000).unwrap();
        assert!(EnergyOnsetDetector::new(256, 128, 0.05).detect(&audio).unwrap().is_empty());
    }
}
