use thiserror::Error;

/// Main error type for the clicktrack library
#[derive(Error, Debug)]
pub enum ClicktrackError {
    #[error("No audio input provided")]
    InputMissing,

    #[error("No detector could be loaded for the requested analyses: {}", requested.join(", "))]
    DetectorsUnavailable { requested: Vec<String> },

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Detection error: {0}")]
    Detector(#[from] DetectorError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio-specific errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },

    #[error("Waveform length mismatch: expected {expected} frames, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Per-feature detector errors. These never abort sibling analyses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("{feature} detector '{detector}' is not available")]
    Unavailable { feature: String, detector: String },

    #[error("{feature} detection failed: {cause}")]
    Failure { feature: String, cause: String },
}

impl DetectorError {
    pub fn failure<F: Into<String>, C: Into<String>>(feature: F, cause: C) -> Self {
        Self::Failure {
            feature: feature.into(),
            cause: cause.into(),
        }
    }

    /// Name of the analysis this error belongs to
    pub fn feature(&self) -> &str {
        match self {
            Self::Unavailable { feature, .. } | Self::Failure { feature, .. } => feature,
        }
    }

    /// One-line reason shown in the report; the full detail goes to the log
    pub fn short_message(&self) -> String {
        match self {
            Self::Unavailable { detector, .. } => format!("detector '{}' not available", detector),
            Self::Failure { cause, .. } => cause.lines().next().unwrap_or("unknown error").to_string(),
        }
    }
}

/// Output-specific errors
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {path}: {reason}")]
    WriteFailure { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ClicktrackError
pub type Result<T> = std::result::Result<T, ClicktrackError>;

impl ClicktrackError {
    /// Whether the pipeline stopped before producing any section
    pub fn halts_pipeline(&self) -> bool {
        matches!(
            self,
            Self::InputMissing | Self::DetectorsUnavailable { .. } | Self::Audio(_)
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::InputMissing => "Please provide an audio file first.".to_string(),
            Self::DetectorsUnavailable { .. } => {
                "No detection capability could be loaded. Check the detector names in the configuration.".to_string()
            }
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!("Could not load audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Audio(AudioError::UnsupportedFormat { format }) => {
                format!("Unsupported audio format '{}'. Supported: wav, mp3, flac, ogg, m4a, aac", format)
            }
            Self::Detector(err) => err.short_message(),
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_keeps_first_line() {
        let err = DetectorError::failure("Tempo Estimation", "model crashed\nstack frame 1\nstack frame 2");
        assert_eq!(err.short_message(), "model crashed");
        assert_eq!(err.feature(), "Tempo Estimation");
    }

    #[test]
    fn test_halting_errors() {
        assert!(ClicktrackError::InputMissing.halts_pipeline());
        assert!(ClicktrackError::DetectorsUnavailable { requested: vec!["Beat Tracking".into()] }.halts_pipeline());

        let write = ClicktrackError::from(OutputError::WriteFailure {
            path: "out.wav".into(),
            reason: "read-only".into(),
        });
        assert!(!write.halts_pipeline());
    }

    #[test]
    fn test_detectors_unavailable_lists_features() {
        let err = ClicktrackError::DetectorsUnavailable {
            requested: vec!["Beat Tracking".into(), "Onset Detection".into()],
        };
        assert!(err.to_string().contains("Beat Tracking, Onset Detection"));
    }
}
