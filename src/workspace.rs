//! Sample library discovery and output directory housekeeping

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::audio::AudioLoader;
use crate::error::Result;

/// First matching keyword picks the icon
const SAMPLE_ICONS: [(&str, &str); 8] = [
    ("guitar", "🎸"),
    ("drum", "🥁"),
    ("beat", "🥁"),
    ("piano", "🎹"),
    ("keyboard", "🎹"),
    ("vocal", "🎤"),
    ("voice", "🎤"),
    ("bass", "🎸"),
];

const DEFAULT_ICON: &str = "🎵";

/// An audio file from the sample library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    /// Display name derived from the file stem
    pub name: String,
    pub path: PathBuf,
    pub icon: &'static str,
    pub file_name: String,
}

impl SampleEntry {
    fn from_path(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = friendly_name(&stem);
        let icon = icon_for(&name);
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            name,
            path,
            icon,
            file_name,
        }
    }
}

/// `my_song-live` becomes `my song - live`
pub fn friendly_name(stem: &str) -> String {
    stem.replace('_', " ").replace('-', " - ")
}

fn icon_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    SAMPLE_ICONS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// List supported audio files directly inside `directory`, sorted by name
///
/// A missing directory yields an empty list.
pub fn discover_samples<P: AsRef<Path>>(directory: P) -> Result<Vec<SampleEntry>> {
    let directory = directory.as_ref();
    if !directory.is_dir() {
        warn!("Samples directory not found: {:?}", directory);
        return Ok(Vec::new());
    }

    debug!("Scanning samples directory: {:?}", directory);
    let mut samples = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        let supported = AudioLoader::detect_format(&path)
            .map_or(false, |ext| AudioLoader::is_format_supported(&ext));

        if path.is_file() && supported {
            samples.push(SampleEntry::from_path(path));
        }
    }

    samples.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(samples)
}

/// What a cleanup pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub deleted: usize,
    pub bytes: u64,
}

/// Delete files under `directory` (recursively) last modified more than
/// `days` days ago. `days == 0` disables cleanup.
pub fn cleanup_old_files<P: AsRef<Path>>(directory: P, days: u32) -> Result<CleanupSummary> {
    let directory = directory.as_ref();
    let mut summary = CleanupSummary::default();

    if days == 0 || !directory.is_dir() {
        return Ok(summary);
    }

    let max_age = Duration::from_secs(u64::from(days) * 86_400);
    let cutoff = SystemTime::now().checked_sub(max_age).unwrap_or(SystemTime::UNIX_EPOCH);
    remove_older_than(directory, cutoff, &mut summary)?;

    if summary.deleted > 0 {
        info!(
            "🧹 Cleaned up {} files ({:.2} MB) older than {} days",
            summary.deleted,
            summary.bytes as f64 / 1024.0 / 1024.0,
            days
        );
    }
    Ok(summary)
}

fn remove_older_than(directory: &Path, cutoff: SystemTime, summary: &mut CleanupSummary) -> Result<()> {
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            remove_older_than(&path, cutoff, summary)?;
        } else if metadata.is_file() && metadata.modified()? < cutoff {
            fs::remove_file(&path)?;
            debug!("Removed {:?}", path);
            summary.deleted += 1;
            summary.bytes += metadata.len();
        }
    }
    Ok(())
}
