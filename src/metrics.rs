//! Derived metrics per detection feature

use crate::detection::{DetectionResult, EventSet};

/// Summary of a beat-tracking run
#[derive(Debug, Clone, PartialEq)]
pub struct BeatMetrics {
    /// `60 / mean(inter-beat interval)`, 0 with fewer than two beats
    pub bpm: f64,
    pub total_beats: usize,
    pub total_downbeats: usize,
    pub first_beat: Option<f64>,
    pub last_beat: Option<f64>,
}

/// Onsets per second, or undefined for zero-length audio
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnsetDensity {
    PerSecond(f64),
    Undefined,
}

/// Summary of an onset-detection run
#[derive(Debug, Clone, PartialEq)]
pub struct OnsetMetrics {
    pub total_onsets: usize,
    pub density: OnsetDensity,
    pub first_onset: Option<f64>,
    pub last_onset: Option<f64>,
}

/// Summary of a tempo-estimation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoMetrics {
    pub primary_tempo: f64,
}

/// Metrics for whichever feature a detection produced
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureMetrics {
    Beats(BeatMetrics),
    Onsets(OnsetMetrics),
    Tempo(TempoMetrics),
}

/// Computes the derived metrics shown in the report
pub struct MetricAggregator;

impl MetricAggregator {
    pub fn aggregate(result: &DetectionResult, source_duration: f64) -> FeatureMetrics {
        match result {
            DetectionResult::Beats { beats, downbeats } => FeatureMetrics::Beats(Self::beats(beats, downbeats)),
            DetectionResult::Onsets { onsets } => FeatureMetrics::Onsets(Self::onsets(onsets, source_duration)),
            DetectionResult::Tempo { bpm } => FeatureMetrics::Tempo(TempoMetrics { primary_tempo: *bpm }),
        }
    }

    pub fn beats(beats: &EventSet, downbeats: &EventSet) -> BeatMetrics {
        BeatMetrics {
            bpm: Self::bpm(beats.times()),
            total_beats: beats.len(),
            total_downbeats: downbeats.len(),
            first_beat: beats.first(),
            last_beat: beats.last(),
        }
    }

    pub fn onsets(onsets: &EventSet, source_duration: f64) -> OnsetMetrics {
        OnsetMetrics {
            total_onsets: onsets.len(),
            density: Self::density(onsets.len(), source_duration),
            first_onset: onsets.first(),
            last_onset: onsets.last(),
        }
    }

    /// Tempo from the mean inter-beat interval.
    ///
    /// Fewer than two beats, or beats that all share one timestamp, give 0.
    pub fn bpm(times: &[f64]) -> f64 {
        if times.len() < 2 {
            return 0.0;
        }

        let intervals = times.windows(2).map(|pair| pair[1] - pair[0]);
        let mean = intervals.sum::<f64>() / (times.len() - 1) as f64;

        if mean > 0.0 {
            60.0 / mean
        } else {
            0.0
        }
    }

    pub fn density(count: usize, duration: f64) -> OnsetDensity {
        if duration > 0.0 && duration.is_finite() {
            OnsetDensity::PerSecond(count as f64 / duration)
        } else {
            OnsetDensity::Undefined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bpm_from_half_second_beats() {
        let beats = EventSet::from_times(vec![0.5, 1.0, 1.5]);
        let metrics = MetricAggregator::beats(&beats, &EventSet::empty());
        assert!((metrics.bpm - 120.0).abs() < 1e-9);
        assert_eq!(metrics.total_beats, 3);
        assert_eq!(metrics.total_downbeats, 0);
        assert_eq!(metrics.first_beat, Some(0.5));
        assert_eq!(metrics.last_beat, Some(1.5));
    }

    #[test]
    fn test_bpm_uses_mean_interval() {
        // intervals 0.4, 0.6, 0.5 -> mean 0.5
        let bpm = MetricAggregator::bpm(&[0.0, 0.4, 1.0, 1.5]);
        assert!((bpm - 120.0).abs() < 1e-9);

        let bpm = MetricAggregator::bpm(&[2.0, 2.75, 3.5]);
        assert!((bpm - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_bpm_degenerate_inputs() {
        assert_eq!(MetricAggregator::bpm(&[]), 0.0);
        assert_eq!(MetricAggregator::bpm(&[1.0]), 0.0);
        assert_eq!(MetricAggregator::bpm(&[1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_empty_onsets_over_ten_seconds() {
        let metrics = MetricAggregator::onsets(&EventSet::empty(), 10.0);
        assert_eq!(metrics.total_onsets, 0);
        assert_eq!(metrics.density, OnsetDensity::PerSecond(0.0));
        assert_eq!(metrics.first_onset, None);
    }

    #[test]
    fn test_density_per_second() {
        let onsets = EventSet::from_times(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        let metrics = MetricAggregator::onsets(&onsets, 2.5);
        assert_eq!(metrics.density, OnsetDensity::PerSecond(2.0));
    }

    #[test]
    fn test_zero_duration_density_is_undefined() {
        let onsets = EventSet::from_times(vec![0.0]);
        assert_eq!(MetricAggregator::onsets(&onsets, 0.0).density, OnsetDensity::Undefined);
    }

    #[test]
    fn test_aggregate_dispatch() {
        let tempo = MetricAggregator::aggregate(&DetectionResult::Tempo { bpm: 97.5 }, 3.0);
        assert_eq!(tempo, FeatureMetrics::Tempo(TempoMetrics { primary_tempo: 97.5 }));

        let beats = DetectionResult::Beats {
            beats: EventSet::from_tagged(vec![(0.0, true), (0.5, false), (1.0, false), (1.5, false), (2.0, true)]),
            downbeats: EventSet::from_times(vec![0.0, 2.0]),
        };
        match MetricAggregator::aggregate(&beats, 3.0) {
            FeatureMetrics::Beats(m) => {
                assert_eq!(m.total_beats, 5);
                assert_eq!(m.total_downbeats, 2);
            }
            other => panic!("unexpected metrics {:?}", other),
        }
    }
}
