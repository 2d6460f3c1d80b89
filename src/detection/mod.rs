//! # Detection
//!
//! Beat, onset and tempo detection behind capability traits.
//!
//! Detectors are opaque: the engine only sees [`BeatDetector`],
//! [`OnsetDetector`] and [`TempoDetector`], looks concrete variants up by name
//! in the [`DetectorRegistry`], and lets the [`DetectionAdapter`] turn their
//! native output into a [`DetectionResult`].

pub mod adapter;
pub mod energy;
pub mod registry;
pub mod spectral;
pub mod tracking;
pub mod traits;
pub mod types;

pub use adapter::DetectionAdapter;
pub use registry::{DetectorRegistry, DetectorSet};
pub use traits::{BeatDetector, OnsetDetector, TempoDetector};
pub use types::{AnalysisType, DetectionResult, EventSet, RawBeat, RawTempo};
