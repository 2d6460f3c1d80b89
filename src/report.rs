//! Markdown analysis report
//!
//! Sections always appear in the same order: file information, then beat
//! tracking, onset detection and tempo estimation for whichever analyses were
//! requested. A feature whose detector failed keeps its heading and shows a
//! one-line status instead of metrics.

use std::collections::BTreeMap;
use std::fmt;

use crate::audio::{AudioBuffer, FileMetadata};
use crate::detection::{AnalysisType, DetectionResult};
use crate::error::DetectorError;
use crate::metrics::{FeatureMetrics, MetricAggregator, OnsetDensity};

const FOOTER: &str = "---\n✅ **Analysis completed!**\n\n💡 **Tip:** Play audio outputs below to hear detected features.\n";

/// What a section describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    File,
    Feature(AnalysisType),
}

impl SectionKind {
    pub fn heading(&self) -> &'static str {
        match self {
            Self::File => "📁 File Information",
            Self::Feature(AnalysisType::BeatTracking) => "🥁 Beat Tracking",
            Self::Feature(AnalysisType::OnsetDetection) => "🎯 Onset Detection",
            Self::Feature(AnalysisType::TempoEstimation) => "⏱️ Tempo Estimation",
        }
    }
}

/// One `name: value` line; `note` is printed after the value, unquoted
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub note: Option<String>,
}

impl Field {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            note: None,
        }
    }

    fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub fields: Vec<Field>,
}

impl Section {
    /// Value of the named field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }

    /// Whether this section reports a failed feature
    pub fn is_unavailable(&self) -> bool {
        self.field("Status").map_or(false, |s| s.starts_with("unavailable"))
    }
}

/// The finished report
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    sections: Vec<Section>,
    failure: Option<String>,
}

impl Report {
    /// A report carrying only a top-level error
    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            sections: Vec::new(),
            failure: Some(message.into()),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub fn render(&self) -> String {
        if let Some(message) = &self.failure {
            return format!("# ❌ Error\n\n**Analysis failed:** `{}`\n\nCheck the log for details.\n", message);
        }

        let mut out = String::from("# 🎵 Analysis Results\n\n");
        for section in &self.sections {
            out.push_str(&format!("## {}\n", section.kind.heading()));
            for field in &section.fields {
                out.push_str(&format!("- **{}:** `{}`", field.name, field.value));
                if let Some(note) = &field.note {
                    out.push_str(&format!(" ({})", note));
                }
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(FOOTER);
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Assembles reports from detection results
pub struct ReportBuilder;

impl ReportBuilder {
    /// Build the report for one analysis run
    ///
    /// Only analyses present in `results` get a section; an `Err` entry
    /// becomes an unavailable section.
    pub fn build(
        metadata: &FileMetadata,
        audio: &AudioBuffer,
        results: &BTreeMap<AnalysisType, Result<DetectionResult, DetectorError>>,
    ) -> Report {
        let mut sections = vec![Self::file_section(metadata, audio)];

        for analysis in AnalysisType::ALL {
            let Some(result) = results.get(&analysis) else {
                continue;
            };

            let kind = SectionKind::Feature(analysis);
            let fields = match result {
                Ok(detection) => Self::metric_fields(MetricAggregator::aggregate(detection, audio.duration())),
                Err(err) => vec![Field::new("Status", format!("unavailable: {}", err.short_message()))],
            };
            sections.push(Section { kind, fields });
        }

        Report { sections, failure: None }
    }

    fn file_section(metadata: &FileMetadata, audio: &AudioBuffer) -> Section {
        let duration = audio.duration();
        Section {
            kind: SectionKind::File,
            fields: vec![
                Field::new("Filename", metadata.file_name.clone()),
                Field::new("Size", format!("{:.1} KB", metadata.size_kb())),
                Field::new("Duration", format!("{:.2}s", duration)).with_note(format!("{:.1} minutes", duration / 60.0)),
                Field::new("Sample Rate", format!("{} Hz", audio.sample_rate())),
                Field::new("Channels", audio.channels().to_string()),
            ],
        }
    }

    fn metric_fields(metrics: FeatureMetrics) -> Vec<Field> {
        match metrics {
            FeatureMetrics::Beats(m) => vec![
                Field::new("BPM", format!("{:.1}", m.bpm)),
                Field::new("Total Beats", m.total_beats.to_string()),
                Field::new("Total Downbeats", m.total_downbeats.to_string()),
                Field::new("First Beat", seconds(m.first_beat)),
                Field::new("Last Beat", seconds(m.last_beat)),
            ],
            FeatureMetrics::Onsets(m) => vec![
                Field::new("Total Onsets", m.total_onsets.to_string()),
                Field::new(
                    "Density",
                    match m.density {
                        OnsetDensity::PerSecond(d) => format!("{:.1} onsets/second", d),
                        OnsetDensity::Undefined => "undefined (zero-length audio)".to_string(),
                    },
                ),
                Field::new("First Onset", seconds(m.first_onset)),
                Field::new("Last Onset", seconds(m.last_onset)),
            ],
            FeatureMetrics::Tempo(m) => vec![Field::new("Primary Tempo", format!("{:.1} BPM", m.primary_tempo))],
        }
    }
}

fn seconds(time: Option<f64>) -> String {
    time.map_or_else(|| "n/a".to_string(), |t| format!("{:.2}s", t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::EventSet;
    use std::path::PathBuf;

    fn metadata() -> FileMetadata {
        FileMetadata {
            path: PathBuf::from("/music/groove.wav"),
            file_name: "groove.wav".to_string(),
            size_bytes: 1_764_044,
            extension: "wav".to_string(),
            bit_depth: Some(16),
            codec: None,
        }
    }

    fn ten_seconds() -> AudioBuffer {
        AudioBuffer::silent(441_000, 2, 44100).unwrap()
    }

    fn beats(times: Vec<(f64, bool)>) -> DetectionResult {
        let beats = EventSet::from_tagged(times);
        let downbeats = beats.tagged_subset();
        DetectionResult::Beats { beats, downbeats }
    }

    #[test]
    fn test_full_report_text() {
        let mut results = BTreeMap::new();
        results.insert(AnalysisType::TempoEstimation, Ok(DetectionResult::Tempo { bpm: 119.96 }));
        results.insert(
            AnalysisType::BeatTracking,
            Ok(beats(vec![(0.5, true), (1.0, false), (1.5, false)])),
        );
        results.insert(
            AnalysisType::OnsetDetection,
            Ok(DetectionResult::Onsets {
                onsets: EventSet::from_times(vec![0.25, 0.5, 1.75]),
            }),
        );

        let report = ReportBuilder::build(&metadata(), &ten_seconds(), &results);
        let expected = "\
# 🎵 Analysis Results

## 📁 File Information
- **Filename:** `groove.wav`
- **Size:** `1722.7 KB`
- **Duration:** `10.00s` (0.2 minutes)
- **Sample Rate:** `44100 Hz`
- **Channels:** `2`

## 🥁 Beat Tracking
- **BPM:** `120.0`
- **Total Beats:** `3`
- **Total Downbeats:** `1`
- **First Beat:** `0.50s`
- **Last Beat:** `1.50s`

## 🎯 Onset Detection
- **Total Onsets:** `3`
- **Density:** `0.3 onsets/second`
- **First Onset:** `0.25s`
- **Last Onset:** `1.75s`

## ⏱️ Tempo Estimation
- **Primary Tempo:** `120.0 BPM`

---
✅ **Analysis completed!**

💡 **Tip:** Play audio outputs below to hear detected features.
";
        assert_eq!(report.render(), expected);
        assert_eq!(report.render(), ReportBuilder::build(&metadata(), &ten_seconds(), &results).render());
    }

    #[test]
    fn test_only_requested_sections() {
        let mut results = BTreeMap::new();
        results.insert(
            AnalysisType::OnsetDetection,
            Ok(DetectionResult::Onsets { onsets: EventSet::empty() }),
        );

        let report = ReportBuilder::build(&metadata(), &ten_seconds(), &results);
        let kinds: Vec<SectionKind> = report.sections().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SectionKind::File, SectionKind::Feature(AnalysisType::OnsetDetection)]);

        let onsets = report.section(SectionKind::Feature(AnalysisType::OnsetDetection)).unwrap();
        assert_eq!(onsets.field("Total Onsets"), Some("0"));
        assert_eq!(onsets.field("Density"), Some("0.0 onsets/second"));
        assert_eq!(onsets.field("First Onset"), Some("n/a"));
    }

    #[test]
    fn test_failed_feature_keeps_siblings() {
        let mut results = BTreeMap::new();
        results.insert(AnalysisType::BeatTracking, Ok(beats(vec![(0.5, true), (1.0, false)])));
        results.insert(
            AnalysisType::TempoEstimation,
            Err(DetectorError::failure("Tempo Estimation", "model crashed\ntraceback line")),
        );

        let report = ReportBuilder::build(&metadata(), &ten_seconds(), &results);
        assert_eq!(report.sections().len(), 3);

        let tempo = report.section(SectionKind::Feature(AnalysisType::TempoEstimation)).unwrap();
        assert!(tempo.is_unavailable());
        assert_eq!(tempo.field("Status"), Some("unavailable: model crashed"));
        assert!(!report.render().contains("traceback"));

        let beats = report.section(SectionKind::Feature(AnalysisType::BeatTracking)).unwrap();
        assert_eq!(beats.field("BPM"), Some("120.0"));
    }

    #[test]
    fn test_zero_length_density() {
        let mut results = BTreeMap::new();
        results.insert(
            AnalysisType::OnsetDetection,
            Ok(DetectionResult::Onsets { onsets: EventSet::empty() }),
        );
        let empty = AudioBuffer::silent(0, 1, 44100).unwrap();

        let report = ReportBuilder::build(&metadata(), &empty, &results);
        let onsets = report.section(SectionKind::Feature(AnalysisType::OnsetDetection)).unwrap();
        assert_eq!(onsets.field("Density"), Some("undefined (zero-length audio)"));
    }

    #[test]
    fn test_failure_report() {
        let report = Report::failure("Please provide an audio file first.");
        assert!(report.is_failure());
        assert!(report.sections().is_empty());
        assert!(report.render().starts_with("# ❌ Error\n\n**Analysis failed:** `Please provide an audio file first.`"));
    }
}
