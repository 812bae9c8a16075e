//! Output directory preparation before frame capture, and the impact
//! manifest written next to the screenshots afterwards.
//!
//! Under [`OutputPolicy::Wipe`] the screenshot and frame directories are
//! scratch space owned by hawkeye: whatever they held is deleted.

use crate::audio::detector::ImpactEvent;
use crate::config::OutputPolicy;
use crate::error::{HawkeyeError, Result};
use crate::media::probe::VideoMetadata;
use crate::pipeline::types::CapturedFrame;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Directories a run writes into, after preparation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedOutputs {
    pub screenshot_dir: PathBuf,
    pub frames_dir: PathBuf,
}

/// Configured output locations plus the policy applied to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub screenshot_dir: PathBuf,
    pub frames_dir: PathBuf,
    pub policy: OutputPolicy,
}

impl OutputDirs {
    /// Apply the policy and return the directories to write into.
    pub fn prepare(&self) -> Result<PreparedOutputs> {
        match self.policy {
            OutputPolicy::Wipe => {
                reset_dir(&self.screenshot_dir)?;
                reset_dir(&self.frames_dir)?;
                Ok(PreparedOutputs {
                    screenshot_dir: self.screenshot_dir.clone(),
                    frames_dir: self.frames_dir.clone(),
                })
            }
            OutputPolicy::PerRun => {
                let run = run_dir_name();
                let prepared = PreparedOutputs {
                    screenshot_dir: self.screenshot_dir.join(&run),
                    frames_dir: self.frames_dir.join(&run),
                };
                create_dir(&prepared.screenshot_dir)?;
                create_dir(&prepared.frames_dir)?;
                Ok(prepared)
            }
        }
    }
}

/// File name of the manifest inside the screenshot directory.
pub const MANIFEST_FILE: &str = "impacts.json";

/// One line of the manifest per detected impact, in detection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    /// 1-based
    pub impact: usize,
    pub timestamp_secs: f64,
    pub capture_secs: Option<f64>,
    /// Screenshot file name; `None` when the capture failed.
    pub image: Option<String>,
}

/// Per-impact index of a run's screenshots, for tools that analyse them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactManifest {
    pub video: PathBuf,
    pub frame_rate: f64,
    pub frame_rate_detected: bool,
    pub impacts: Vec<ManifestEntry>,
}

impl ImpactManifest {
    pub fn new(
        video: &Path,
        metadata: VideoMetadata,
        impacts: &[ImpactEvent],
        captured: &[CapturedFrame],
    ) -> Self {
        let entries = impacts
            .iter()
            .enumerate()
            .map(|(i, event)| {
                let frame = captured
                    .iter()
                    .find(|frame| frame.timestamp_secs == event.timestamp_secs);
                ManifestEntry {
                    impact: i + 1,
                    timestamp_secs: event.timestamp_secs,
                    capture_secs: frame.map(|f| f.capture_secs),
                    image: frame.and_then(|f| {
                        f.path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned())
                    }),
                }
            })
            .collect();

        Self {
            video: video.to_path_buf(),
            frame_rate: metadata.frame_rate,
            frame_rate_detected: metadata.frame_rate_detected,
            impacts: entries,
        }
    }

    /// Write as pretty JSON to `dir`/[`MANIFEST_FILE`].
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| output_error(dir, e.to_string()))?;
        fs::write(&path, json + "\n").map_err(|e| output_error(dir, e.to_string()))?;
        Ok(path)
    }
}

fn run_dir_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("run-{}", millis)
}

fn output_error(path: &Path, message: impl Into<String>) -> HawkeyeError {
    HawkeyeError::OutputDir {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| output_error(path, e.to_string()))
}

/// Delete `path` with everything in it, then recreate it empty.
///
/// Refuses paths that name the filesystem root, the working directory or a
/// parent of it.
fn reset_dir(path: &Path) -> Result<()> {
    let has_name = path
        .components()
        .any(|c| matches!(c, Component::Normal(_)));
    let climbs = path.components().last() == Some(Component::ParentDir);
    if !has_name || climbs {
        return Err(output_error(path, "refusing to wipe this location"));
    }

    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(output_error(path, e.to_string())),
    }
    create_dir(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dirs(root: &Path, policy: OutputPolicy) -> OutputDirs {
        OutputDirs {
            screenshot_dir: root.join("impact_screenshots"),
            frames_dir: root.join("frames"),
            policy,
        }
    }

    #[test]
    fn wipe_creates_missing_directories() {
        let root = TempDir::new().unwrap();
        let prepared = dirs(root.path(), OutputPolicy::Wipe).prepare().unwrap();

        assert!(prepared.screenshot_dir.is_dir());
        assert!(prepared.frames_dir.is_dir());
        assert_eq!(prepared.screenshot_dir, root.path().join("impact_screenshots"));
    }

    #[test]
    fn wipe_deletes_previous_contents() {
        let root = TempDir::new().unwrap();
        let outputs = dirs(root.path(), OutputPolicy::Wipe);
        fs::create_dir_all(outputs.screenshot_dir.join("nested")).unwrap();
        fs::write(outputs.screenshot_dir.join("impact_1.000.png"), b"old").unwrap();
        fs::write(outputs.screenshot_dir.join("nested/x"), b"old").unwrap();
        fs::create_dir_all(&outputs.frames_dir).unwrap();
        fs::write(outputs.frames_dir.join("f.png"), b"old").unwrap();

        outputs.prepare().unwrap();

        assert_eq!(fs::read_dir(&outputs.screenshot_dir).unwrap().count(), 0);
        assert_eq!(fs::read_dir(&outputs.frames_dir).unwrap().count(), 0);
    }

    #[test]
    fn per_run_keeps_previous_contents() {
        let root = TempDir::new().unwrap();
        let outputs = dirs(root.path(), OutputPolicy::PerRun);
        fs::create_dir_all(&outputs.screenshot_dir).unwrap();
        let old = outputs.screenshot_dir.join("impact_1.000.png");
        fs::write(&old, b"old").unwrap();

        let prepared = outputs.prepare().unwrap();

        assert!(old.exists());
        assert!(prepared.screenshot_dir.starts_with(&outputs.screenshot_dir));
        assert_ne!(prepared.screenshot_dir, outputs.screenshot_dir);
        assert!(prepared.screenshot_dir.is_dir());
        assert!(prepared.frames_dir.is_dir());
        let name = prepared.screenshot_dir.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("run-"));
    }

    fn event(timestamp_secs: f64) -> ImpactEvent {
        ImpactEvent {
            timestamp_secs,
            sample_index: (timestamp_secs * 44_100.0) as usize,
        }
    }

    #[test]
    fn manifest_lists_every_impact_in_order() {
        let root = TempDir::new().unwrap();
        let impacts = [event(0.5), event(1.25)];
        let captured = [CapturedFrame {
            timestamp_secs: 1.25,
            capture_secs: 1.16,
            path: root.path().join("impact_1.250.png"),
        }];
        let metadata = VideoMetadata {
            frame_rate: 30.0,
            frame_rate_detected: true,
        };

        let manifest = ImpactManifest::new(Path::new("rally.mp4"), metadata, &impacts, &captured);

        assert_eq!(manifest.impacts.len(), 2);
        assert_eq!(manifest.impacts[0].impact, 1);
        assert_eq!(manifest.impacts[0].image, None);
        assert_eq!(manifest.impacts[0].capture_secs, None);
        assert_eq!(manifest.impacts[1].image.as_deref(), Some("impact_1.250.png"));
        assert_eq!(manifest.impacts[1].capture_secs, Some(1.16));
    }

    #[test]
    fn manifest_is_written_as_json() {
        let root = TempDir::new().unwrap();
        let manifest = ImpactManifest::new(
            Path::new("rally.mp4"),
            VideoMetadata::default(),
            &[event(2.0)],
            &[],
        );

        let path = manifest.write_to(root.path()).unwrap();
        assert_eq!(path, root.path().join(MANIFEST_FILE));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["video"], "rally.mp4");
        assert_eq!(value["frame_rate"], 25.0);
        assert_eq!(value["frame_rate_detected"], false);
        assert_eq!(value["impacts"][0]["timestamp_secs"], 2.0);
        assert!(value["impacts"][0]["image"].is_null());
    }

    #[test]
    fn manifest_write_fails_for_missing_directory() {
        let root = TempDir::new().unwrap();
        let manifest =
            ImpactManifest::new(Path::new("rally.mp4"), VideoMetadata::default(), &[], &[]);
        assert!(matches!(
            manifest.write_to(&root.path().join("gone")),
            Err(HawkeyeError::OutputDir { .. })
        ));
    }

    #[test]
    fn wipe_refuses_current_and_root_directories() {
        assert!(reset_dir(Path::new(".")).is_err());
        assert!(reset_dir(Path::new("")).is_err());
        assert!(reset_dir(Path::new("/")).is_err());
        assert!(reset_dir(Path::new("shots/..")).is_err());
    }
}
