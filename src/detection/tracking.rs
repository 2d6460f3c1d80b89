use std::collections::BTreeMap;

use crate::audio::AudioBuffer;
use crate::config::DetectorConfig;
use crate::detection::traits::{BeatDetector, OnsetDetector, TempoDetector};
use crate::detection::types::{RawBeat, RawTempo};

/// Beat tracking by thinning onsets to a plausible tempo
///
/// Onsets closer than `60 / max_bpm` to the previously accepted beat are
/// dropped. Every `beats_per_bar`-th accepted beat, starting with the first,
/// is reported as a downbeat.
pub struct OnsetBeatTracker {
    onsets: Box<dyn OnsetDetector>,
    max_bpm: f32,
    beats_per_bar: u32,
}

impl OnsetBeatTracker {
    pub fn new(onsets: Box<dyn OnsetDetector>, max_bpm: f32, beats_per_bar: u32) -> Self {
        Self {
            onsets,
            max_bpm,
            beats_per_bar: beats_per_bar.max(1),
        }
    }

    pub fn from_config(onsets: Box<dyn OnsetDetector>, config: &DetectorConfig) -> Self {
        Self::new(onsets, config.max_bpm, config.beats_per_bar)
    }

    /// Thin sorted onset times into bar-labelled beats
    pub fn track(&self, onsets: &[f64]) -> Vec<RawBeat> {
        let min_interval = 60.0 / self.max_bpm as f64;
        let mut beats: Vec<RawBeat> = Vec::new();

        for &time in onsets {
            if beats.last().map_or(true, |b| time - b.time >= min_interval) {
                let bar_position = (beats.len() as u32 % self.beats_per_bar) + 1;
                beats.push(RawBeat { time, bar_position });
            }
        }

        beats
    }
}

impl BeatDetector for OnsetBeatTracker {
    fn name(&self) -> &str {
        "onset-tracker"
    }

    fn description(&self) -> &str {
        "Onsets thinned by minimum beat interval, downbeat every bar"
    }

    fn detect(&self, audio: &AudioBuffer) -> anyhow::Result<Vec<RawBeat>> {
        let mut onsets = self.onsets.detect(audio)?;
        onsets.sort_by(f64::total_cmp);

        let beats = self.track(&onsets);
        tracing::debug!(
            "Tracked {} beats from {} {} onsets",
            beats.len(),
            onsets.len(),
            self.onsets.name()
        );
        Ok(beats)
    }
}

/// Tempo from the most common inter-beat interval
///
/// Intervals are quantized to whole milliseconds and counted. Output is a
/// list of `[bpm, strength]` candidates, strongest first.
pub struct IntervalHistogramTempo {
    beats: Box<dyn BeatDetector>,
    min_bpm: f32,
    max_bpm: f32,
}

impl IntervalHistogramTempo {
    pub fn new(beats: Box<dyn BeatDetector>, min_bpm: f32, max_bpm: f32) -> Self {
        Self { beats, min_bpm, max_bpm }
    }

    pub fn from_config(beats: Box<dyn BeatDetector>, config: &DetectorConfig) -> Self {
        Self::new(beats, config.min_bpm, config.max_bpm)
    }

    /// Ranked `(bpm, strength)` candidates from beat times
    pub fn candidates(&self, beat_times: &[f64]) -> Vec<(f64, f64)> {
        let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
        let mut total = 0usize;

        for pair in beat_times.windows(2) {
            let interval = pair[1] - pair[0];
            if interval <= 0.0 {
                continue;
            }
            let bpm = 60.0 / interval;
            if bpm < self.min_bpm as f64 || bpm > self.max_bpm as f64 {
                continue;
            }
            *histogram.entry((interval * 1000.0).round() as i64).or_insert(0) += 1;
            total += 1;
        }

        let mut ranked: Vec<(i64, usize)> = histogram.into_iter().collect();
        // most frequent first; shorter interval wins ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .map(|(ms, count)| (60_000.0 / ms as f64, count as f64 / total as f64))
            .collect()
    }
}

impl TempoDetector for IntervalHistogramTempo {
    fn name(&self) -> &str {
        "interval-histogram"
    }

    fn description(&self) -> &str {
        "Most frequent quantized inter-beat interval"
    }

    fn estimate(&self, audio: &AudioBuffer) -> anyhow::Result<RawTempo> {
        let beats = self.beats.detect(audio)?;
        let times: Vec<f64> = beats.iter().map(|b| b.time).collect();
        let candidates = self.candidates(&times);

        if let Some((bpm, strength)) = candidates.first() {
            tracing::debug!("Tempo estimate {:.1} BPM (strength {:.2})", bpm, strength);
        }

        Ok(RawTempo::from(
            candidates
                .into_iter()
                .map(|(bpm, strength)| vec![bpm, strength])
                .collect::<Vec<_>>(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOnsets(Vec<f64>);

    impl OnsetDetector for FixedOnsets {
        fn name(&self) -> &str {
            "fixed"
        }

        fn detect(&self, _audio: &AudioBuffer) -> anyhow::Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    fn audio() -> AudioBuffer {
        AudioBuffer::silent(10, 1, 8000).unwrap()
    }

    #[test]
    fn test_close_onsets_are_thinned() {
        let tracker = OnsetBeatTracker::new(Box::new(FixedOnsets(vec![])), 200.0, 4);
        let beats = tracker.track(&[0.0, 0.1, 0.5, 0.55, 1.0, 1.5, 2.0]);

        let times: Vec<f64> = beats.iter().map(|b| b.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5, 2.0]);

        let positions: Vec<u32> = beats.iter().map(|b| b.bar_position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 1]);
    }

    #[test]
    fn test_tracker_sorts_detector_output() {
        let tracker = OnsetBeatTracker::new(Box::new(FixedOnsets(vec![1.0, 0.0, 0.5])), 200.0, 3);
        let beats = tracker.detect(&audio()).unwrap();
        assert_eq!(beats[0], RawBeat { time: 0.0, bar_position: 1 });
        assert_eq!(beats[2], RawBeat { time: 1.0, bar_position: 3 });
    }

    #[test]
    fn test_histogram_prefers_most_common_interval() {
        let tracker = OnsetBeatTracker::new(Box::new(FixedOnsets(vec![0.0, 0.5, 1.0, 1.5, 2.25, 2.75])), 200.0, 4);
        let tempo = IntervalHistogramTempo::new(Box::new(tracker), 60.0, 200.0);

        let raw = tempo.estimate(&audio()).unwrap();
        assert_eq!(raw.leading_scalar(), Some(120.0));

        let candidates = tempo.candidates(&[0.0, 0.5, 1.0, 1.5, 2.25, 2.75]);
        assert_eq!(candidates[0], (120.0, 0.8));
        assert_eq!(candidates[1], (80.0, 0.2));
    }

    #[test]
    fn test_out_of_range_intervals_ignored() {
        let tempo = IntervalHistogramTempo::new(Box::new(OnsetBeatTracker::new(Box::new(FixedOnsets(vec![])), 200.0, 4)), 60.0, 200.0);
        // 2s interval = 30 BPM
        assert!(tempo.candidates(&[0.0, 2.0, 4.0]).is_empty());
        assert_eq!(tempo.estimate(&audio()).unwrap(), RawTempo::List(vec![]));
    }
}
