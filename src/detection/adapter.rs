use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::audio::AudioBuffer;
use crate::detection::registry::DetectorSet;
use crate::detection::types::{AnalysisType, DetectionResult, EventSet, RawBeat, RawTempo};
use crate::error::DetectorError;

/// Runs opaque detectors and normalizes their native output
///
/// Every failure mode (unloadable detector, returned error, panic) ends up as
/// a [`DetectorError`] for that one feature.
pub struct DetectionAdapter;

impl DetectionAdapter {
    /// Run the detector for `analysis` on a blocking worker
    pub async fn run(
        analysis: AnalysisType,
        detectors: &DetectorSet,
        audio: Arc<AudioBuffer>,
    ) -> Result<DetectionResult, DetectorError> {
        let feature = analysis.to_string();
        debug!("Running {} detection", feature);

        let outcome = match analysis {
            AnalysisType::BeatTracking => {
                let detector = detectors.beat.clone()?;
                tokio::task::spawn_blocking(move || detector.detect(&audio))
                    .await
                    .map_err(|e| Self::join_failure(&feature, e))?
                    .map(Self::beats)
            }
            AnalysisType::OnsetDetection => {
                let detector = detectors.onset.clone()?;
                tokio::task::spawn_blocking(move || detector.detect(&audio))
                    .await
                    .map_err(|e| Self::join_failure(&feature, e))?
                    .map(Self::onsets)
            }
            AnalysisType::TempoEstimation => {
                let detector = detectors.tempo.clone()?;
                tokio::task::spawn_blocking(move || detector.estimate(&audio))
                    .await
                    .map_err(|e| Self::join_failure(&feature, e))?
                    .and_then(|raw| Self::tempo(raw).map_err(anyhow::Error::msg))
            }
        };

        outcome.map_err(|e| {
            warn!("{} detector failed: {:?}", feature, e);
            DetectorError::failure(&feature, format!("{:#}", e))
        })
    }

    /// Beat rows to beats plus the downbeat subset (bar position 1)
    pub fn beats(raw: Vec<RawBeat>) -> DetectionResult {
        let beats = EventSet::from_tagged(raw.into_iter().map(|b| (b.time, b.bar_position == 1)).collect());
        let downbeats = beats.tagged_subset();
        DetectionResult::Beats { beats, downbeats }
    }

    pub fn onsets(raw: Vec<f64>) -> DetectionResult {
        DetectionResult::Onsets {
            onsets: EventSet::from_times(raw),
        }
    }

    /// Reduce any tempo shape to its leading scalar; empty output means 0 BPM
    pub fn tempo(raw: RawTempo) -> Result<DetectionResult, String> {
        match raw.leading_scalar() {
            None => Ok(DetectionResult::Tempo { bpm: 0.0 }),
            Some(bpm) if bpm.is_finite() && bpm >= 0.0 => Ok(DetectionResult::Tempo { bpm }),
            Some(bpm) => Err(format!("detector returned invalid tempo {}", bpm)),
        }
    }

    fn join_failure(feature: &str, err: JoinError) -> DetectorError {
        let cause = if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            format!("detector panicked: {}", message)
        } else {
            "detector task was cancelled".to_string()
        };

        warn!("{} detector task failed: {}", feature, cause);
        DetectorError::failure(feature, cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BeatDetector, OnsetDetector, TempoDetector};

    struct StubBeats;
    impl BeatDetector for StubBeats {
        fn name(&self) -> &str {
            "stub"
        }
        fn detect(&self, _audio: &AudioBuffer) -> anyhow::Result<Vec<RawBeat>> {
            Ok(vec![
                RawBeat { time: 1.0, bar_position: 3 },
                RawBeat { time: 0.0, bar_position: 1 },
                RawBeat { time: 0.5, bar_position: 2 },
                RawBeat { time: 1.5, bar_position: 1 },
            ])
        }
    }

    struct BrokenOnsets;
    impl OnsetDetector for BrokenOnsets {
        fn name(&self) -> &str {
            "broken"
        }
        fn detect(&self, _audio: &AudioBuffer) -> anyhow::Result<Vec<f64>> {
            Err(anyhow::anyhow!("activation model missing").context("onset network failed"))
        }
    }

    struct PanickingTempo;
    impl TempoDetector for PanickingTempo {
        fn name(&self) -> &str {
            "panics"
        }
        fn estimate(&self, _audio: &AudioBuffer) -> anyhow::Result<RawTempo> {
            panic!("index out of bounds")
        }
    }

    fn detectors() -> DetectorSet {
        DetectorSet::new(Arc::new(StubBeats), Arc::new(BrokenOnsets), Arc::new(PanickingTempo))
    }

    fn audio() -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::silent(100, 1, 8000).unwrap())
    }

    #[tokio::test]
    async fn test_beats_are_sorted_with_downbeats() {
        let result = DetectionAdapter::run(AnalysisType::BeatTracking, &detectors(), audio()).await.unwrap();
        match result {
            DetectionResult::Beats { beats, downbeats } => {
                assert_eq!(beats.times(), &[0.0, 0.5, 1.0, 1.5]);
                assert_eq!(downbeats.times(), &[0.0, 1.5]);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detector_error_becomes_failure() {
        let err = DetectionAdapter::run(AnalysisType::OnsetDetection, &detectors(), audio()).await.unwrap_err();
        assert_eq!(err.feature(), "Onset Detection");
        assert_eq!(err.short_message(), "onset network failed: activation model missing");
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let err = DetectionAdapter::run(AnalysisType::TempoEstimation, &detectors(), audio()).await.unwrap_err();
        assert!(matches!(err, DetectorError::Failure { .. }));
        assert!(err.short_message().contains("index out of bounds"));
    }

    #[tokio::test]
    async fn test_unavailable_detector_passes_through() {
        let mut set = detectors();
        set.beat = Err(DetectorError::Unavailable {
            feature: "Beat Tracking".into(),
            detector: "missing".into(),
        });

        let err = DetectionAdapter::run(AnalysisType::BeatTracking, &set, audio()).await.unwrap_err();
        assert!(matches!(err, DetectorError::Unavailable { .. }));
    }

    #[test]
    fn test_tempo_coercion() {
        let nested = RawTempo::from(vec![vec![128.4, 0.6], vec![64.2, 0.4]]);
        assert_eq!(DetectionAdapter::tempo(nested), Ok(DetectionResult::Tempo { bpm: 128.4 }));
        assert_eq!(DetectionAdapter::tempo(RawTempo::List(vec![])), Ok(DetectionResult::Tempo { bpm: 0.0 }));
        assert!(DetectionAdapter::tempo(RawTempo::Scalar(f64::NAN)).is_err());
        assert!(DetectionAdapter::tempo(RawTempo::Scalar(-5.0)).is_err());
    }

    #[test]
    fn test_onsets_drop_invalid_times() {
        let result = DetectionAdapter::onsets(vec![0.3, -1.0, 0.1, f64::NAN]);
        assert_eq!(
            result,
            DetectionResult::Onsets {
                onsets: EventSet::from_times(vec![0.1, 0.3])
            }
        );
    }
}
