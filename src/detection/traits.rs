use crate::audio::AudioBuffer;
use crate::detection::types::{RawBeat, RawTempo};

/// Beat and downbeat tracking capability
///
/// Implementations are black boxes to the engine. Errors may carry any amount
/// of internal detail; only the first line reaches the report.
pub trait BeatDetector: Send + Sync {
    /// Returns the unique name of this detector
    fn name(&self) -> &str;

    /// Returns a human-readable description of the algorithm
    fn description(&self) -> &str {
        ""
    }

    /// Beat times in seconds, each with its position in the bar
    fn detect(&self, audio: &AudioBuffer) -> anyhow::Result<Vec<RawBeat>>;
}

/// Onset detection capability
pub trait OnsetDetector: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Onset times in seconds, in any order
    fn detect(&self, audio: &AudioBuffer) -> anyhow::Result<Vec<f64>>;
}

/// Global tempo estimation capability
pub trait TempoDetector: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Tempo in BPM, possibly wrapped in ranked candidate lists
    fn estimate(&self, audio: &AudioBuffer) -> anyhow::Result<RawTempo>;
}
