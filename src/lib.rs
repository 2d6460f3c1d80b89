//! # Clicktrack
//!
//! Detect beats, onsets and tempo in a recording, then render click-track
//! overlays so a listener can hear what was detected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clicktrack::{AnalysisEngine, AnalysisType, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = AnalysisEngine::new(Config::default());
//! let request = engine.request(
//!     Some("song.wav"),
//!     vec![AnalysisType::BeatTracking, AnalysisType::OnsetDetection],
//! );
//!
//! let outcome = engine.analyze(&request).await?;
//! println!("{}", outcome.report);
//! for overlay in &outcome.overlays {
//!     println!("wrote {:?}", overlay.destination);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`audio`] - Decoding input and writing overlay WAV files
//! - [`detection`] - Detector traits, built-in detectors and the adapter
//! - [`metrics`] - BPM, counts and onset density
//! - [`overlay`] - Click synthesis, channel mixing and peak normalization
//! - [`report`] - Markdown report assembly
//! - [`pipeline`] - The engine tying it together
//! - [`workspace`] - Sample library listing and output cleanup
//!
//! ## Custom Detectors
//!
//! Any algorithm can be plugged in by implementing one of the detector traits
//! and registering it by name:
//!
//! ```rust,no_run
//! use clicktrack::audio::AudioBuffer;
//! use clicktrack::detection::{DetectorRegistry, OnsetDetector};
//!
//! struct EveryHalfSecond;
//!
//! impl OnsetDetector for EveryHalfSecond {
//!     fn name(&self) -> &str {
//!         "every-half-second"
//!     }
//!
//!     fn detect(&self, audio: &AudioBuffer) -> anyhow::Result<Vec<f64>> {
//!         let count = (audio.duration() / 0.5) as usize;
//!         Ok((0..count).map(|i| i as f64 * 0.5).collect())
//!     }
//! }
//!
//! let mut registry = DetectorRegistry::new();
//! registry.register_onset("every-half-second", |_| Box::new(EveryHalfSecond));
//! ```

pub mod audio;
pub mod config;
pub mod detection;
pub mod error;
pub mod metrics;
pub mod overlay;
pub mod pipeline;
pub mod report;
pub mod workspace;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    detection::{AnalysisType, DetectionResult, DetectorRegistry, DetectorSet, EventSet},
    error::{ClicktrackError, Result},
    pipeline::{AnalysisEngine, AnalysisOutcome, AnalysisRequest},
    report::{Report, ReportBuilder},
};
