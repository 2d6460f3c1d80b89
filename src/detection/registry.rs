use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DetectorConfig;
use crate::detection::{
    energy::EnergyOnsetDetector,
    spectral::SpectralFluxOnsetDetector,
    tracking::{IntervalHistogramTempo, OnsetBeatTracker},
    BeatDetector, OnsetDetector, TempoDetector,
};
use crate::detection::types::AnalysisType;
use crate::error::DetectorError;

type Factory<T> = Box<dyn Fn(&DetectorConfig) -> Box<T> + Send + Sync>;

/// Registry of detector implementations by name
///
/// Each analysis type has its own namespace. Factories receive the detector
/// configuration so one registration serves any tuning.
pub struct DetectorRegistry {
    beat: HashMap<String, Factory<dyn BeatDetector>>,
    onset: HashMap<String, Factory<dyn OnsetDetector>>,
    tempo: HashMap<String, Factory<dyn TempoDetector>>,
}

impl DetectorRegistry {
    /// Create a registry with all built-in detectors
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_detectors();
        registry
    }

    /// Create a registry with nothing registered
    pub fn empty() -> Self {
        Self {
            beat: HashMap::new(),
            onset: HashMap::new(),
            tempo: HashMap::new(),
        }
    }

    fn register_builtin_detectors(&mut self) {
        self.register_onset("spectral-flux", |c| Box::new(SpectralFluxOnsetDetector::from_config(c)));
        self.register_onset("energy", |c| Box::new(EnergyOnsetDetector::from_config(c)));

        self.register_beat("onset-tracker", |c| {
            Box::new(OnsetBeatTracker::from_config(
                Box::new(SpectralFluxOnsetDetector::from_config(c)),
                c,
            ))
        });
        self.register_beat("energy-tracker", |c| {
            Box::new(OnsetBeatTracker::from_config(
                Box::new(EnergyOnsetDetector::from_config(c)),
                c,
            ))
        });

        self.register_tempo("interval-histogram", |c| {
            let beats = OnsetBeatTracker::from_config(Box::new(SpectralFluxOnsetDetector::from_config(c)), c);
            Box::new(IntervalHistogramTempo::from_config(Box::new(beats), c))
        });
    }

    pub fn register_beat<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&DetectorConfig) -> Box<dyn BeatDetector> + Send + Sync + 'static,
    {
        self.beat.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_onset<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&DetectorConfig) -> Box<dyn OnsetDetector> + Send + Sync + 'static,
    {
        self.onset.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_tempo<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&DetectorConfig) -> Box<dyn TempoDetector> + Send + Sync + 'static,
    {
        self.tempo.insert(name.to_string(), Box::new(factory));
    }

    /// Sorted names registered for an analysis type
    pub fn available(&self, analysis: AnalysisType) -> Vec<String> {
        let mut names: Vec<String> = match analysis {
            AnalysisType::BeatTracking => self.beat.keys().cloned().collect(),
            AnalysisType::OnsetDetection => self.onset.keys().cloned().collect(),
            AnalysisType::TempoEstimation => self.tempo.keys().cloned().collect(),
        };
        names.sort();
        names
    }

    /// Instantiate the detectors named in `config`
    pub fn build(&self, config: &DetectorConfig) -> DetectorSet {
        fn lookup<T: ?Sized>(
            map: &HashMap<String, Factory<T>>,
            name: &str,
            analysis: AnalysisType,
            config: &DetectorConfig,
        ) -> Result<Arc<T>, DetectorError> {
            map.get(name)
                .map(|factory| Arc::from(factory(config)))
                .ok_or_else(|| DetectorError::Unavailable {
                    feature: analysis.to_string(),
                    detector: name.to_string(),
                })
        }

        DetectorSet {
            beat: lookup(&self.beat, &config.beat, AnalysisType::BeatTracking, config),
            onset: lookup(&self.onset, &config.onset, AnalysisType::OnsetDetection, config),
            tempo: lookup(&self.tempo, &config.tempo, AnalysisType::TempoEstimation, config),
        }
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The detectors one engine runs with; a slot holds the reason when its
/// detector could not be loaded
#[derive(Clone)]
pub struct DetectorSet {
    pub beat: Result<Arc<dyn BeatDetector>, DetectorError>,
    pub onset: Result<Arc<dyn OnsetDetector>, DetectorError>,
    pub tempo: Result<Arc<dyn TempoDetector>, DetectorError>,
}

impl DetectorSet {
    /// Assemble a set from concrete detectors
    pub fn new(
        beat: Arc<dyn BeatDetector>,
        onset: Arc<dyn OnsetDetector>,
        tempo: Arc<dyn TempoDetector>,
    ) -> Self {
        Self {
            beat: Ok(beat),
            onset: Ok(onset),
            tempo: Ok(tempo),
        }
    }

    pub fn is_available(&self, analysis: AnalysisType) -> bool {
        match analysis {
            AnalysisType::BeatTracking => self.beat.is_ok(),
            AnalysisType::OnsetDetection => self.onset.is_ok(),
            AnalysisType::TempoEstimation => self.tempo.is_ok(),
        }
    }
}
