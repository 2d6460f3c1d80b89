use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    audio::{AudioBuffer, AudioFile, AudioLoader, AudioWriter},
    config::Config,
    detection::{AnalysisType, DetectionAdapter, DetectionResult, DetectorRegistry, DetectorSet, EventSet},
    error::{AudioError, ClicktrackError, DetectorError, OutputError, Result},
    overlay::{OverlayKind, OverlayOutput, OverlayRenderer},
    report::{Report, ReportBuilder},
};

/// One analysis invocation
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Source file; `None` fails with [`ClicktrackError::InputMissing`]
    pub audio: Option<PathBuf>,
    pub analyses: Vec<AnalysisType>,
    /// Where overlay files go, created if missing
    pub output_dir: PathBuf,
}

impl AnalysisRequest {
    pub fn new<A, O>(audio: Option<A>, analyses: Vec<AnalysisType>, output_dir: O) -> Self
    where
        A: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self {
            audio: audio.map(Into::into),
            analyses,
            output_dir: output_dir.into(),
        }
    }
}

/// Everything one invocation produced
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report: Report,
    /// Overlays that were written successfully
    pub overlays: Vec<OverlayOutput>,
    /// Per-feature and write errors that did not stop the run
    pub failures: Vec<ClicktrackError>,
}

type FeatureResults = BTreeMap<AnalysisType, std::result::Result<DetectionResult, DetectorError>>;

/// Orchestrates detection, overlay rendering and reporting
///
/// The engine follows a clear pipeline:
/// 1. Input - Load and decode the requested file
/// 2. Detection - Run every requested detector concurrently
/// 3. Overlays - Render click tracks for beats and onsets
/// 4. Output - Write overlay files to the request's output directory
/// 5. Report - Assemble the sections in fixed order
pub struct AnalysisEngine {
    config: Config,
    detectors: DetectorSet,
}

impl AnalysisEngine {
    /// Create an engine with the detectors named in the configuration
    pub fn new(config: Config) -> Self {
        let detectors = DetectorRegistry::new().build(&config.detectors);
        Self::with_detectors(config, detectors)
    }

    /// Create an engine with an explicit detector set
    pub fn with_detectors(config: Config, detectors: DetectorSet) -> Self {
        Self { config, detectors }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Request writing into the configured output directory
    pub fn request<P: Into<PathBuf>>(&self, audio: Option<P>, analyses: Vec<AnalysisType>) -> AnalysisRequest {
        AnalysisRequest {
            audio: audio.map(Into::into),
            analyses,
            output_dir: self.config.output.directory.clone(),
        }
    }

    /// Run a full analysis
    ///
    /// Only a missing input, an undecodable file or a total lack of detectors
    /// return `Err`. Anything else is recorded in the outcome.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        let audio_path = request.audio.as_deref().ok_or(ClicktrackError::InputMissing)?;

        info!("🎵 Starting analysis");
        info!("   Audio: {:?}", audio_path);
        info!("   Output: {:?}", request.output_dir);

        // Pipeline Step 1: Input
        let file = self.load_input(audio_path).await?;

        self.analyze_file(file, &request.analyses, &request.output_dir).await
    }

    /// Run steps 2 to 5 on an already decoded file
    pub async fn analyze_file(
        &self,
        file: AudioFile,
        analyses: &[AnalysisType],
        output_dir: &Path,
    ) -> Result<AnalysisOutcome> {
        let requested: BTreeSet<AnalysisType> = analyses.iter().copied().collect();
        self.check_availability(&requested)?;

        let AudioFile { buffer, metadata } = file;
        let audio = Arc::new(buffer);
        let mut failures = Vec::new();

        // Pipeline Step 2: Detection
        let results = self.run_detectors(&requested, &audio).await;
        for err in results.values().filter_map(|r| r.as_ref().err()) {
            failures.push(ClicktrackError::from(err.clone()));
        }

        // Pipeline Step 3: Overlays
        let rendered = self.render_overlays(&results, &audio).await;
        let mut buffers = Vec::new();
        for (kind, result) in rendered {
            match result {
                Ok(buffer) => buffers.push((kind, buffer)),
                Err(e) => {
                    warn!("Failed to render {} overlay: {}", kind.file_prefix(), e);
                    failures.push(e);
                }
            }
        }

        // Pipeline Step 4: Output
        let (overlays, write_failures) = self.write_overlays(buffers, output_dir).await;
        failures.extend(write_failures);

        // Pipeline Step 5: Report
        info!("📝 Step 5: Building report...");
        let report = ReportBuilder::build(&metadata, &audio, &results);

        info!(
            "🎉 Analysis complete: {} sections, {} overlays, {} failures",
            report.sections().len(),
            overlays.len(),
            failures.len()
        );

        Ok(AnalysisOutcome {
            report,
            overlays,
            failures,
        })
    }

    // ==========================================
    // PIPELINE STEP 1: INPUT
    // ==========================================

    async fn load_input(&self, path: &Path) -> Result<AudioFile> {
        info!("📂 Step 1: Loading audio file...");

        let file = AudioLoader::load(path).await.map_err(|e| {
            warn!("Failed to load audio file: {}", e);
            e
        })?;

        info!(
            "   Loaded: {:.1}s, {} Hz, {} channels",
            file.buffer.duration(),
            file.buffer.sample_rate(),
            file.buffer.channels()
        );
        Ok(file)
    }

    fn check_availability(&self, requested: &BTreeSet<AnalysisType>) -> Result<()> {
        let unavailable: Vec<AnalysisType> = requested
            .iter()
            .copied()
            .filter(|a| !self.detectors.is_available(*a))
            .collect();

        for analysis in &unavailable {
            warn!("No detector available for {}, skipping", analysis);
        }

        if !requested.is_empty() && unavailable.len() == requested.len() {
            return Err(ClicktrackError::DetectorsUnavailable {
                requested: requested.iter().map(|a| a.to_string()).collect(),
            });
        }
        Ok(())
    }

    // ==========================================
    // PIPELINE STEP 2: DETECTION
    // ==========================================

    async fn run_detectors(&self, requested: &BTreeSet<AnalysisType>, audio: &Arc<AudioBuffer>) -> FeatureResults {
        info!("🥁 Step 2: Running {} detectors...", requested.len());

        let (beats, onsets, tempo) = tokio::join!(
            self.detect_if_requested(AnalysisType::BeatTracking, requested, audio),
            self.detect_if_requested(AnalysisType::OnsetDetection, requested, audio),
            self.detect_if_requested(AnalysisType::TempoEstimation, requested, audio),
        );

        let mut results = FeatureResults::new();
        for (analysis, result) in [
            (AnalysisType::BeatTracking, beats),
            (AnalysisType::OnsetDetection, onsets),
            (AnalysisType::TempoEstimation, tempo),
        ] {
            if let Some(result) = result {
                match &result {
                    Ok(_) => info!("   ✅ {}", analysis),
                    Err(e) => info!("   ❌ {}: {}", analysis, e.short_message()),
                }
                results.insert(analysis, result);
            }
        }
        results
    }

    async fn detect_if_requested(
        &self,
        analysis: AnalysisType,
        requested: &BTreeSet<AnalysisType>,
        audio: &Arc<AudioBuffer>,
    ) -> Option<std::result::Result<DetectionResult, DetectorError>> {
        if !requested.contains(&analysis) {
            return None;
        }
        Some(DetectionAdapter::run(analysis, &self.detectors, Arc::clone(audio)).await)
    }

    // ==========================================
    // PIPELINE STEP 3: OVERLAYS
    // ==========================================

    async fn render_overlays(
        &self,
        results: &FeatureResults,
        audio: &Arc<AudioBuffer>,
    ) -> Vec<(OverlayKind, Result<AudioBuffer>)> {
        let mut jobs: Vec<(OverlayKind, EventSet, EventSet)> = Vec::new();
        for result in results.values().filter_map(|r| r.as_ref().ok()) {
            match result {
                DetectionResult::Beats { beats, downbeats } => {
                    jobs.push((OverlayKind::Beats, beats.clone(), downbeats.clone()))
                }
                DetectionResult::Onsets { onsets } => {
                    jobs.push((OverlayKind::Onsets, onsets.clone(), EventSet::empty()))
                }
                DetectionResult::Tempo { .. } => {}
            }
        }

        if jobs.is_empty() {
            return Vec::new();
        }

        info!("🎧 Step 3: Rendering {} click overlays...", jobs.len());
        let kinds: Vec<OverlayKind> = jobs.iter().map(|(kind, _, _)| *kind).collect();
        let renderer = OverlayRenderer::new(self.config.clicks.clone());
        let audio = Arc::clone(audio);

        let task = tokio::task::spawn_blocking(move || {
            jobs.into_iter()
                .map(|(kind, events, accents)| {
                    let rendered = match kind {
                        OverlayKind::Beats => renderer.render_beats(&audio, &events, &accents),
                        OverlayKind::Onsets => renderer.render_onsets(&audio, &events),
                    };
                    (kind, rendered)
                })
                .collect::<Vec<_>>()
        });

        match task.await {
            Ok(rendered) => rendered,
            Err(e) => kinds
                .into_iter()
                .map(|kind| {
                    let err = AudioError::InvalidParameters {
                        details: format!("overlay rendering task failed: {}", e),
                    };
                    (kind, Err(ClicktrackError::from(err)))
                })
                .collect(),
        }
    }

    // ==========================================
    // PIPELINE STEP 4: OUTPUT
    // ==========================================

    async fn write_overlays(
        &self,
        buffers: Vec<(OverlayKind, AudioBuffer)>,
        output_dir: &Path,
    ) -> (Vec<OverlayOutput>, Vec<ClicktrackError>) {
        if buffers.is_empty() {
            return (Vec::new(), Vec::new());
        }

        info!("💾 Step 4: Writing overlays to {:?}...", output_dir);

        let timestamp = chrono::Utc::now().timestamp();

        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            warn!("Cannot create output directory {:?}: {}", output_dir, e);
            let failures = buffers
                .iter()
                .map(|(kind, _)| {
                    ClicktrackError::from(OutputError::WriteFailure {
                        path: kind.destination(output_dir, timestamp).display().to_string(),
                        reason: format!("cannot create output directory: {}", e),
                    })
                })
                .collect();
            return (Vec::new(), failures);
        }

        let writer = AudioWriter::new(self.config.output.bits_per_sample);
        let output_dir = output_dir.to_path_buf();

        let task = tokio::task::spawn_blocking(move || {
            let mut overlays = Vec::new();
            let mut failures = Vec::new();

            for (kind, buffer) in buffers {
                let destination = kind.destination(&output_dir, timestamp);
                match writer.write(&buffer, &destination) {
                    Ok(()) => {
                        debug!("   Wrote {:?}", destination);
                        overlays.push(OverlayOutput {
                            kind,
                            buffer,
                            destination,
                        });
                    }
                    Err(e) => {
                        warn!("Failed to write {:?}: {}", destination, e);
                        failures.push(e);
                    }
                }
            }
            (overlays, failures)
        });

        match task.await {
            Ok(written) => written,
            Err(e) => {
                let err = OutputError::WriteFailure {
                    path: "overlays".to_string(),
                    reason: format!("writer task failed: {}", e),
                };
                (Vec::new(), vec![err.into()])
            }
        }
    }
}
