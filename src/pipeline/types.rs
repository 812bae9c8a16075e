//! Data types shared by the pipeline coordinator and its readers.

use crate::audio::detector::ImpactEvent;
use crate::defaults;
use crate::media::probe::VideoMetadata;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Working phase of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Idle,
    ExtractingAudio,
    DetectingImpacts,
    ProbingMetadata,
    CapturingFrames,
}

impl Stage {
    /// The stage that follows this one, `None` after capture.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::ExtractingAudio),
            Stage::ExtractingAudio => Some(Stage::DetectingImpacts),
            Stage::DetectingImpacts => Some(Stage::ProbingMetadata),
            Stage::ProbingMetadata => Some(Stage::CapturingFrames),
            Stage::CapturingFrames => None,
        }
    }

    /// Progress reported on entering this stage.
    pub fn percent(self) -> u8 {
        match self {
            Stage::Idle => 0,
            Stage::ExtractingAudio => defaults::PERCENT_EXTRACTING,
            Stage::DetectingImpacts => defaults::PERCENT_DETECTING,
            Stage::ProbingMetadata => defaults::PERCENT_PROBING,
            Stage::CapturingFrames => defaults::PERCENT_CAPTURING,
        }
    }

    /// Status line shown on entering this stage.
    pub fn message(self) -> &'static str {
        match self {
            Stage::Idle => "Waiting for a video...",
            Stage::ExtractingAudio => "Step 1: Extracting audio from video...",
            Stage::DetectingImpacts => "Step 2: Analysing audio for impacts...",
            Stage::ProbingMetadata => "Step 3: Reading video frame rate...",
            Stage::CapturingFrames => "Step 4: Capturing screenshots at impact points...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ExtractingAudio => "extracting-audio",
            Stage::DetectingImpacts => "detecting-impacts",
            Stage::ProbingMetadata => "probing-metadata",
            Stage::CapturingFrames => "capturing-frames",
        };
        f.write_str(name)
    }
}

/// Outcome of a run. `Succeeded`, `Failed` and `SkippedEmpty` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "kebab-case")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed(String),
    /// The audio held no impacts; nothing was captured.
    SkippedEmpty,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed(_) | RunStatus::SkippedEmpty
        )
    }

    /// Success-shaped outcomes, including "no impacts".
    pub fn is_ok(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::SkippedEmpty)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => f.write_str("pending"),
            RunStatus::Running => f.write_str("running"),
            RunStatus::Succeeded => f.write_str("done"),
            RunStatus::Failed(reason) => write!(f, "failed: {}", reason),
            RunStatus::SkippedEmpty => f.write_str("no impacts found"),
        }
    }
}

/// State of one run. Written only by the coordinator; readers get clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRun {
    pub video: PathBuf,
    pub stage: Stage,
    pub status: RunStatus,
    pub impacts: Vec<ImpactEvent>,
    pub metadata: VideoMetadata,
}

impl PipelineRun {
    pub fn new(video: PathBuf) -> Self {
        Self {
            video,
            stage: Stage::Idle,
            status: RunStatus::Pending,
            impacts: Vec::new(),
            metadata: VideoMetadata::default(),
        }
    }
}

/// One progress update for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub status: RunStatus,
    pub message: String,
    /// 0..=100
    pub percent: u8,
}

impl ProgressEvent {
    pub fn new(stage: Stage, status: RunStatus, message: impl Into<String>, percent: u8) -> Self {
        Self {
            stage,
            status,
            message: message.into(),
            percent: percent.min(100),
        }
    }

    /// Event announcing entry into `stage`.
    pub fn entering(stage: Stage) -> Self {
        Self::new(stage, RunStatus::Running, stage.message(), stage.percent())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// A screenshot written for one impact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedFrame {
    /// Impact time as heard.
    pub timestamp_secs: f64,
    /// Seek position after delay compensation.
    pub capture_secs: f64,
    pub path: PathBuf,
}

/// Everything a caller needs after a run has ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub video: PathBuf,
    pub status: RunStatus,
    pub impacts: Vec<ImpactEvent>,
    pub metadata: VideoMetadata,
    pub captured: Vec<CapturedFrame>,
    /// Impact timestamps whose capture failed.
    pub failed_captures: Vec<f64>,
    /// Directory screenshots were written to, if capture started.
    pub screenshot_dir: Option<PathBuf>,
    /// Per-impact JSON index inside `screenshot_dir`.
    pub manifest: Option<PathBuf>,
}
