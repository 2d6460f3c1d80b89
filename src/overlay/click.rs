use serde::{Deserialize, Serialize};

use crate::detection::EventSet;

/// A click sound: tone frequency, burst length and mix weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickSpec {
    /// Tone frequency in Hz
    pub frequency: f32,

    /// Burst length in seconds
    pub duration: f32,

    /// Mix weight (0.0-1.0)
    pub weight: f32,
}

impl ClickSpec {
    pub const BEAT: ClickSpec = ClickSpec {
        frequency: 800.0,
        duration: 0.10,
        weight: 0.3,
    };

    pub const DOWNBEAT: ClickSpec = ClickSpec {
        frequency: 1200.0,
        duration: 0.15,
        weight: 0.3,
    };

    pub const ONSET: ClickSpec = ClickSpec {
        frequency: 1500.0,
        duration: 0.08,
        weight: 0.3,
    };

    pub fn validate(&self) -> Result<(), String> {
        if !(self.frequency > 0.0) {
            return Err(format!("frequency must be positive, got {}", self.frequency));
        }
        if !(self.duration > 0.0) {
            return Err(format!("duration must be positive, got {}", self.duration));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(format!("weight must be within 0-1, got {}", self.weight));
        }
        Ok(())
    }
}

/// Renders mono click tracks for one [`ClickSpec`] at one sample rate
///
/// Each click is a sine at the configured frequency under an exponential envelope
/// decaying from 1 to 2^-10 over the burst.
#[derive(Debug, Clone)]
pub struct ClickSynthesizer {
    spec: ClickSpec,
    sample_rate: u32,
    burst: Vec<f32>,
}

impl ClickSynthesizer {
    pub fn new(spec: ClickSpec, sample_rate: u32) -> Self {
        let burst = Self::render_burst(&spec, sample_rate);
        Self {
            spec,
            sample_rate,
            burst,
        }
    }

    pub fn spec(&self) -> &ClickSpec {
        &self.spec
    }

    /// The single decaying tone burst written at each event
    pub fn burst(&self) -> &[f32] {
        &self.burst
    }

    fn render_burst(spec: &ClickSpec, sample_rate: u32) -> Vec<f32> {
        let len = ((sample_rate as f64 * spec.duration as f64).round() as usize).max(1);
        let angular = 2.0 * std::f64::consts::PI * spec.frequency as f64 / sample_rate as f64;
        let span = (len - 1).max(1) as f64;

        (0..len)
            .map(|i| {
                let envelope = 2f64.powf(-10.0 * i as f64 / span);
                (envelope * (angular * i as f64).sin()) as f32
            })
            .collect()
    }

    /// Sample index where a burst for `time` starts
    pub fn start_index(&self, time: f64) -> usize {
        (time * self.sample_rate as f64).round() as usize
    }

    /// Mono waveform of `frames` samples with a burst at every event.
    ///
    /// Bursts starting at or past the end are dropped, bursts running past the
    /// end are truncated, overlapping bursts add.
    pub fn render(&self, events: &EventSet, frames: usize) -> Vec<f32> {
        let mut waveform = vec![0.0f32; frames];

        for &time in events.times() {
            let start = self.start_index(time);
            if start >= frames {
                continue;
            }

            let end = (start + self.burst.len()).min(frames);
            for (out, &click) in waveform[start..end].iter_mut().zip(&self.burst) {
                *out += click;
            }
        }

        waveform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_length_and_decay() {
        let synth = ClickSynthesizer::new(ClickSpec::BEAT, 44100);
        assert_eq!(synth.burst().len(), 4410);
        assert_eq!(synth.burst()[0], 0.0);

        let head = synth.burst()[..200].iter().fold(0.0f32, |a, s| a.max(s.abs()));
        let tail = synth.burst()[4200..].iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!(head > 0.5);
        assert!(tail < 0.002);
    }

    #[test]
    fn test_burst_starts_at_rounded_index() {
        let sample_rate = 1000;
        let synth = ClickSynthesizer::new(
            ClickSpec {
                frequency: 100.0,
                duration: 0.02,
                weight: 1.0,
            },
            sample_rate,
        );
        let events = EventSet::from_times(vec![0.1234]);
        let waveform = synth.render(&events, 1000);

        let start = synth.start_index(0.1234);
        assert_eq!(start, 123);
        assert!(waveform[..start].iter().all(|&s| s == 0.0));
        assert!(waveform[start + 1] != 0.0);
        assert!(waveform[start + 20..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_never_writes_past_end() {
        let synth = ClickSynthesizer::new(ClickSpec::DOWNBEAT, 8000);
        let frames = 8000;
        let events = EventSet::from_times(vec![0.0, 0.99, 1.0, 5.0]);

        let waveform = synth.render(&events, frames);
        assert_eq!(waveform.len(), frames);

        // 0.99s -> index 7920, truncated after 80 samples
        let start = synth.start_index(0.99);
        assert_eq!(&waveform[start..], &synth.burst()[..frames - start]);
    }

    #[test]
    fn test_empty_events_are_silent() {
        let synth = ClickSynthesizer::new(ClickSpec::ONSET, 22050);
        let waveform = synth.render(&EventSet::empty(), 500);
        assert!(waveform.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_overlapping_bursts_add() {
        let synth = ClickSynthesizer::new(ClickSpec::BEAT, 1000);
        let single = synth.render(&EventSet::from_times(vec![0.0]), 200);
        let double = synth.render(&EventSet::from_times(vec![0.0, 0.0]), 200);

        for (s, d) in single.iter().zip(&double) {
            assert!((2.0 * s - d).abs() < 1e-6);
        }
    }

    #[test]
    fn test_spec_validation() {
        assert!(ClickSpec::BEAT.validate().is_ok());
        assert!(ClickSpec { frequency: 0.0, ..ClickSpec::BEAT }.validate().is_err());
        assert!(ClickSpec { duration: -1.0, ..ClickSpec::BEAT }.validate().is_err());
        assert!(ClickSpec { weight: 1.1, ..ClickSpec::BEAT }.validate().is_err());
    }
}
