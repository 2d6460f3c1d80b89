//! # Analysis Pipeline
//!
//! The engine runs one analysis end to end: decode, detect, render click
//! overlays, write them out and build the report.

pub mod engine;

pub use engine::{AnalysisEngine, AnalysisOutcome, AnalysisRequest};
