use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    overlay::ClickSpec,
};

/// Main configuration for clicktrack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where overlays are written and how
    pub output: OutputConfig,

    /// Sample library location
    pub samples: SamplesConfig,

    /// Click synthesis constants
    pub clicks: ClickConfig,

    /// Detector selection and analysis parameters
    pub detectors: DetectorConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            tracing::debug!("TOML error in {:?}: {}", path, e);
            ConfigError::ParseFailed {
                path: path.display().to_string(),
            }
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// `TEMP_DIR` and `SAMPLES_DIR` override the configured directories
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("TEMP_DIR") {
            self.output.directory = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("SAMPLES_DIR") {
            self.samples.directory = PathBuf::from(dir);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.clicks.validate()?;
        self.detectors.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Output location and encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving overlay files
    pub directory: PathBuf,

    /// 16 or 24 for integer PCM, 32 for float
    pub bits_per_sample: u16,

    /// Files older than this many days are removed at startup (0 disables)
    pub cleanup_days: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("outputs/demo_analysis"),
            bits_per_sample: 16,
            cleanup_days: 7,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if !matches!(self.bits_per_sample, 16 | 24 | 32) {
            return Err(invalid("output.bits_per_sample", self.bits_per_sample).into());
        }
        Ok(())
    }
}

/// Sample library settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplesConfig {
    pub directory: PathBuf,
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets/audio_samples"),
        }
    }
}

/// Click sounds and normalization headroom
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    pub beat: ClickSpec,
    pub downbeat: ClickSpec,
    pub onset: ClickSpec,

    /// Peak level after normalization
    pub target_peak: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            beat: ClickSpec::BEAT,
            downbeat: ClickSpec::DOWNBEAT,
            onset: ClickSpec::ONSET,
            target_peak: crate::overlay::TARGET_PEAK,
        }
    }
}

impl ClickConfig {
    fn validate(&self) -> Result<()> {
        for (key, spec) in [
            ("clicks.beat", &self.beat),
            ("clicks.downbeat", &self.downbeat),
            ("clicks.onset", &self.onset),
        ] {
            spec.validate().map_err(|details| invalid(key, details))?;
        }

        if !(self.target_peak > 0.0 && self.target_peak <= 1.0) {
            return Err(invalid("clicks.target_peak", self.target_peak).into());
        }
        Ok(())
    }
}

/// Which detector variants run and how they are tuned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Registered beat detector name
    pub beat: String,

    /// Registered onset detector name
    pub onset: String,

    /// Registered tempo detector name
    pub tempo: String,

    /// FFT window size (power of two)
    pub window_size: usize,

    /// Hop between analysis windows
    pub hop_size: usize,

    /// Lowest tempo considered
    pub min_bpm: f32,

    /// Highest tempo considered
    pub max_bpm: f32,

    /// Onset peak-picking sensitivity (0.0-1.0)
    pub sensitivity: f32,

    /// Beats per bar used to tag downbeats
    pub beats_per_bar: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            beat: "onset-tracker".to_string(),
            onset: "spectral-flux".to_string(),
            tempo: "interval-histogram".to_string(),
            window_size: 1024,
            hop_size: 441,
            min_bpm: 60.0,
            max_bpm: 200.0,
            sensitivity: 0.5,
            beats_per_bar: 4,
        }
    }
}

impl DetectorConfig {
    fn validate(&self) -> Result<()> {
        if self.window_size == 0 || !self.window_size.is_power_of_two() {
            return Err(invalid("detectors.window_size", self.window_size).into());
        }

        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(invalid("detectors.hop_size", self.hop_size).into());
        }

        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(invalid("detectors.bpm_range", format!("{}-{}", self.min_bpm, self.max_bpm)).into());
        }

        if !(0.0..=1.0).contains(&self.sensitivity) {
            return Err(invalid("detectors.sensitivity", self.sensitivity).into());
        }

        if self.beats_per_bar == 0 {
            return Err(invalid("detectors.beats_per_bar", self.beats_per_bar).into());
        }

        Ok(())
    }
}
