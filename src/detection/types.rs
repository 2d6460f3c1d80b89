use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Analyses a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnalysisType {
    BeatTracking,
    OnsetDetection,
    TempoEstimation,
}

impl AnalysisType {
    /// Report order
    pub const ALL: [AnalysisType; 3] = [
        AnalysisType::BeatTracking,
        AnalysisType::OnsetDetection,
        AnalysisType::TempoEstimation,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BeatTracking => "Beat Tracking",
            Self::OnsetDetection => "Onset Detection",
            Self::TempoEstimation => "Tempo Estimation",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    /// Accepts display names ("Beat Tracking") and kebab-case ("beat-tracking")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "beat tracking" | "beats" => Ok(Self::BeatTracking),
            "onset detection" | "onsets" => Ok(Self::OnsetDetection),
            "tempo estimation" | "tempo" => Ok(Self::TempoEstimation),
            _ => Err(format!("unknown analysis type: {}", s)),
        }
    }
}

/// Ordered, non-negative timestamps in seconds with an optional boolean tag
/// per event (for beats: "is downbeat")
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSet {
    times: Vec<f64>,
    tags: Option<Vec<bool>>,
}

impl EventSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sort arbitrary detector timestamps into a valid set.
    ///
    /// Non-finite and negative timestamps are discarded.
    pub fn from_times(times: Vec<f64>) -> Self {
        let mut times: Vec<f64> = times.into_iter().filter(|t| t.is_finite() && *t >= 0.0).collect();
        times.sort_by(f64::total_cmp);
        Self { times, tags: None }
    }

    /// Same as [`EventSet::from_times`], keeping each tag paired with its time
    pub fn from_tagged(events: Vec<(f64, bool)>) -> Self {
        let mut paired: Vec<(f64, bool)> = events
            .into_iter()
            .filter(|(t, _)| t.is_finite() && *t >= 0.0)
            .collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self {
            times: paired.iter().map(|&(t, _)| t).collect(),
            tags: Some(paired.iter().map(|&(_, tag)| tag).collect()),
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.times.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.times.last().copied()
    }

    pub fn is_tagged(&self, index: usize) -> bool {
        self.tags
            .as_ref()
            .and_then(|tags| tags.get(index).copied())
            .unwrap_or(false)
    }

    /// The tagged events as an untagged set
    pub fn tagged_subset(&self) -> EventSet {
        let times = self
            .times
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_tagged(*i))
            .map(|(_, &t)| t)
            .collect();
        Self { times, tags: None }
    }
}

/// Canonical per-feature detection output
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    Beats { beats: EventSet, downbeats: EventSet },
    Onsets { onsets: EventSet },
    Tempo { bpm: f64 },
}

impl DetectionResult {
    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            Self::Beats { .. } => AnalysisType::BeatTracking,
            Self::Onsets { .. } => AnalysisType::OnsetDetection,
            Self::Tempo { .. } => AnalysisType::TempoEstimation,
        }
    }
}

/// One row of native beat-tracker output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBeat {
    /// Time in seconds
    pub time: f64,

    /// 1-based position within the bar; 1 is a downbeat
    pub bar_position: u32,
}

/// Native tempo output: a scalar or an arbitrarily nested list of candidates
#[derive(Debug, Clone, PartialEq)]
pub enum RawTempo {
    Scalar(f64),
    List(Vec<RawTempo>),
}

impl RawTempo {
    /// The first scalar in depth-first order, if any
    pub fn leading_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::List(items) => items.iter().find_map(RawTempo::leading_scalar),
        }
    }
}

impl From<f64> for RawTempo {
    fn from(value: f64) -> Self {
        RawTempo::Scalar(value)
    }
}

impl<T: Into<RawTempo>> From<Vec<T>> for RawTempo {
    fn from(values: Vec<T>) -> Self {
        RawTempo::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_set_sorts_and_filters() {
        let set = EventSet::from_times(vec![1.5, f64::NAN, 0.5, -0.1, 1.0, f64::INFINITY]);
        assert_eq!(set.times(), &[0.5, 1.0, 1.5]);
        assert_eq!(set.first(), Some(0.5));
        assert_eq!(set.last(), Some(1.5));
    }

    #[test]
    fn test_tags_follow_their_times() {
        let set = EventSet::from_tagged(vec![(2.0, false), (0.0, true), (1.0, false), (3.0, true)]);
        assert_eq!(set.times(), &[0.0, 1.0, 2.0, 3.0]);
        assert!(set.is_tagged(0));
        assert!(!set.is_tagged(2));
        assert_eq!(set.tagged_subset().times(), &[0.0, 3.0]);
    }

    #[test]
    fn test_untagged_subset_is_empty() {
        let set = EventSet::from_times(vec![0.1, 0.2]);
        assert!(set.tagged_subset().is_empty());
    }

    #[test]
    fn test_leading_scalar_is_depth_first() {
        let nested = RawTempo::from(vec![vec![128.0, 0.7], vec![64.0, 0.3]]);
        assert_eq!(nested.leading_scalar(), Some(128.0));

        let deep = RawTempo::List(vec![RawTempo::List(vec![]), RawTempo::List(vec![RawTempo::Scalar(90.0)])]);
        assert_eq!(deep.leading_scalar(), Some(90.0));

        assert_eq!(RawTempo::List(vec![]).leading_scalar(), None);
        assert_eq!(RawTempo::Scalar(110.0).leading_scalar(), Some(110.0));
    }

    #[test]
    fn test_analysis_type_parsing() {
        assert_eq!("Beat Tracking".parse::<AnalysisType>(), Ok(AnalysisType::BeatTracking));
        assert_eq!("onset-detection".parse::<AnalysisType>(), Ok(AnalysisType::OnsetDetection));
        assert_eq!("tempo".parse::<AnalysisType>(), Ok(AnalysisType::TempoEstimation));
        assert!("chords".parse::<AnalysisType>().is_err());
    }
}
