//! Single-run pipeline: extract → detect → probe → capture.
//!
//! A [`Coordinator`] drives one run through its stages strictly in order,
//! threading a [`RunContext`] from stage to stage. [`Pipeline`] builds
//! coordinators and runs them either inline or on a background worker.

use crate::audio::detector::{DetectorConfig, ImpactDetector, ImpactEvent};
use crate::config::Config;
use crate::defaults;
use crate::error::{HawkeyeError, Result};
use crate::media::capture::{FrameCapturer, capture_time};
use crate::media::executor::{CommandExecutor, SystemCommandExecutor};
use crate::media::extract::{AudioExtractor, ExtractedAudio};
use crate::media::probe::{VideoMetadata, VideoProber};
use crate::output::clear_line;
use crate::pipeline::error::{ErrorReporter, LogReporter, StageError};
use crate::pipeline::outputs::{ImpactManifest, OutputDirs, PreparedOutputs};
use crate::pipeline::progress::{ChannelSink, ProgressSink};
use crate::pipeline::types::{
    CapturedFrame, PipelineRun, ProgressEvent, RunStatus, RunSummary, Stage,
};
use crossbeam_channel::{Receiver, unbounded};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Reason recorded when the soundtrack cannot be decoded.
pub const EXTRACTION_FAILED: &str = "audio extraction failed";

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Decoder executable
    pub decoder: String,
    pub extract_timeout: Duration,
    pub probe_timeout: Duration,
    pub capture_timeout: Duration,
    pub detector: DetectorConfig,
    /// Seconds subtracted from each impact before capture
    pub acoustic_offset_secs: f64,
    pub outputs: OutputDirs,
    /// Verbosity level (0=progress only, 1=per-impact detail, 2=decoder output)
    pub verbosity: u8,
    /// Suppress diagnostic messages
    pub quiet: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            decoder: config.decoder.path.clone(),
            extract_timeout: config.decoder.extract_timeout(),
            probe_timeout: config.decoder.probe_timeout(),
            capture_timeout: config.decoder.capture_timeout(),
            detector: DetectorConfig {
                threshold_ratio: config.detection.threshold_ratio,
                refractory_ms: config.detection.refractory_ms,
            },
            acoustic_offset_secs: config.capture.acoustic_offset_secs,
            outputs: OutputDirs {
                screenshot_dir: config.capture.screenshot_dir.clone(),
                frames_dir: config.capture.frames_dir.clone(),
                policy: config.capture.output_policy,
            },
            verbosity: 0,
            quiet: false,
        }
    }
}

/// Values produced by one stage and consumed by the next.
struct RunContext {
    video: PathBuf,
    audio: Option<ExtractedAudio>,
    impacts: Vec<ImpactEvent>,
    metadata: VideoMetadata,
    outputs: Option<PreparedOutputs>,
    captured: Vec<CapturedFrame>,
    failed_captures: Vec<f64>,
    manifest: Option<PathBuf>,
}

impl RunContext {
    fn new(video: &Path) -> Self {
        Self {
            video: video.to_path_buf(),
            audio: None,
            impacts: Vec::new(),
            metadata: VideoMetadata::default(),
            outputs: None,
            captured: Vec::new(),
            failed_captures: Vec::new(),
            manifest: None,
        }
    }
}

/// How the stages ended, before it is turned into a status and message.
enum Ending {
    Done,
    NoImpacts,
    ExtractionFailed,
}

/// Drives one run. Consumed by [`Coordinator::run`], so it cannot be reused.
pub struct Coordinator {
    extractor: AudioExtractor,
    detector: ImpactDetector,
    prober: VideoProber,
    capturer: FrameCapturer,
    outputs: OutputDirs,
    verbosity: u8,
    quiet: bool,
    sink: Arc<dyn ProgressSink>,
    reporter: Arc<dyn ErrorReporter>,
    state: Arc<RwLock<PipelineRun>>,
}

impl Coordinator {
    pub fn new(
        config: &PipelineConfig,
        executor: Arc<dyn CommandExecutor>,
        sink: Arc<dyn ProgressSink>,
        reporter: Arc<dyn ErrorReporter>,
        state: Arc<RwLock<PipelineRun>>,
    ) -> Self {
        Self {
            extractor: AudioExtractor::new(
                config.decoder.clone(),
                config.extract_timeout,
                executor.clone(),
            ),
            detector: ImpactDetector::new(config.detector),
            prober: VideoProber::new(config.decoder.clone(), config.probe_timeout, executor.clone()),
            capturer: FrameCapturer::new(
                config.decoder.clone(),
                config.capture_timeout,
                config.acoustic_offset_secs,
                executor,
            ),
            outputs: config.outputs.clone(),
            verbosity: config.verbosity,
            quiet: config.quiet,
            sink,
            reporter,
            state,
        }
    }

    /// Run every stage for `video` and return the outcome.
    ///
    /// Errors that escape a stage end the run as `Failed`; they are never
    /// returned to the caller.
    pub fn run(self, video: &Path) -> RunSummary {
        let mut ctx = RunContext::new(video);
        self.update(|run| *run = PipelineRun::new(ctx.video.clone()));

        let (status, message, percent) = match self.run_stages(&mut ctx) {
            Ok(Ending::Done) => {
                let total = ctx.impacts.len();
                let message = if ctx.failed_captures.is_empty() {
                    format!("Processing complete! {} impacts detected and captured.", total)
                } else {
                    format!(
                        "Processing complete! {} impacts detected, {} captured.",
                        total,
                        ctx.captured.len()
                    )
                };
                (RunStatus::Succeeded, message, defaults::PERCENT_DONE)
            }
            Ok(Ending::NoImpacts) => (
                RunStatus::SkippedEmpty,
                "No impacts detected in the audio.".to_string(),
                defaults::PERCENT_NO_IMPACTS,
            ),
            Ok(Ending::ExtractionFailed) => (
                RunStatus::Failed(EXTRACTION_FAILED.to_string()),
                "Failed to extract audio from video.".to_string(),
                defaults::PERCENT_FAILED,
            ),
            Err(e) => {
                let stage = self.snapshot_stage();
                self.reporter
                    .report(&stage.to_string(), &StageError::Fatal(e.to_string()));
                (
                    RunStatus::Failed(e.to_string()),
                    format!("Error: {}", e),
                    defaults::PERCENT_FAILED,
                )
            }
        };

        self.finish(ctx, status, message, percent)
    }

    fn run_stages(&self, ctx: &mut RunContext) -> Result<Ending> {
        self.enter(Stage::ExtractingAudio);
        if let Err(e) = self.extract_audio(ctx) {
            self.reporter.report(&Stage::ExtractingAudio.to_string(), &e);
            return Ok(Ending::ExtractionFailed);
        }

        self.enter(Stage::DetectingImpacts);
        self.detect_impacts(ctx)?;
        if ctx.impacts.is_empty() {
            return Ok(Ending::NoImpacts);
        }

        self.enter(Stage::ProbingMetadata);
        self.probe_metadata(ctx);

        ctx.outputs = Some(self.outputs.prepare()?);
        self.enter(Stage::CapturingFrames);
        self.capture_frames(ctx);
        self.write_manifest(ctx);

        Ok(Ending::Done)
    }

    fn extract_audio(&self, ctx: &mut RunContext) -> std::result::Result<(), StageError> {
        let audio = self
            .extractor
            .extract(&ctx.video)
            .map_err(|e| StageError::Fatal(format!("{}: {}", EXTRACTION_FAILED, e)))?;
        self.log(format_args!(
            "Audio extraction successful: {} bytes",
            audio.size()
        ));
        ctx.audio = Some(audio);
        Ok(())
    }

    fn detect_impacts(&self, ctx: &mut RunContext) -> Result<()> {
        let audio = ctx
            .audio
            .as_ref()
            .ok_or_else(|| HawkeyeError::Other("no extracted audio to analyse".to_string()))?;
        let stream = audio.load()?;
        ctx.impacts = self.detector.detect(&stream);

        for event in &ctx.impacts {
            self.log(format_args!(
                "Impact detected at {:.3} seconds",
                event.timestamp_secs
            ));
        }
        self.log(format_args!("Found {} impacts", ctx.impacts.len()));

        let impacts = ctx.impacts.clone();
        self.update(|run| run.impacts = impacts);
        Ok(())
    }

    fn probe_metadata(&self, ctx: &mut RunContext) {
        ctx.metadata = self.prober.try_probe(&ctx.video).unwrap_or_else(|e| {
            self.reporter.report(
                &Stage::ProbingMetadata.to_string(),
                &StageError::Skippable(format!("frame-rate lookup failed: {}", e)),
            );
            VideoMetadata::default()
        });
        if ctx.metadata.frame_rate_detected {
            self.log(format_args!("Video frame rate: {} fps", ctx.metadata.frame_rate));
        } else {
            self.log(format_args!(
                "Video frame rate not found, using {} fps",
                ctx.metadata.frame_rate
            ));
        }
        let metadata = ctx.metadata;
        self.update(|run| run.metadata = metadata);
    }

    fn capture_frames(&self, ctx: &mut RunContext) {
        let Some(outputs) = ctx.outputs.as_ref() else {
            return;
        };

        for (i, event) in ctx.impacts.iter().enumerate() {
            self.log(format_args!(
                "Impact {} at: {:.3}s",
                i + 1,
                event.timestamp_secs
            ));
            match self
                .capturer
                .capture(&ctx.video, event, &outputs.screenshot_dir)
            {
                Ok(path) => {
                    self.log(format_args!("Frame saved to {}", path.display()));
                    ctx.captured.push(CapturedFrame {
                        timestamp_secs: event.timestamp_secs,
                        capture_secs: capture_time(
                            event.timestamp_secs,
                            self.capturer.acoustic_offset_secs(),
                        ),
                        path,
                    });
                }
                Err(e) => {
                    self.reporter.report(
                        &Stage::CapturingFrames.to_string(),
                        &StageError::Skippable(e.to_string()),
                    );
                    ctx.failed_captures.push(event.timestamp_secs);
                }
            }
        }
    }

    fn write_manifest(&self, ctx: &mut RunContext) {
        let Some(outputs) = ctx.outputs.as_ref() else {
            return;
        };
        let manifest =
            ImpactManifest::new(&ctx.video, ctx.metadata, &ctx.impacts, &ctx.captured);
        match manifest.write_to(&outputs.screenshot_dir) {
            Ok(path) => {
                self.log(format_args!("Impact list saved to {}", path.display()));
                ctx.manifest = Some(path);
            }
            Err(e) => self.reporter.report(
                &Stage::CapturingFrames.to_string(),
                &StageError::Skippable(e.to_string()),
            ),
        }
    }

    fn enter(&self, stage: Stage) {
        self.update(|run| {
            debug_assert_eq!(run.stage.next(), Some(stage));
            run.stage = stage;
            run.status = RunStatus::Running;
        });
        self.sink.publish(ProgressEvent::entering(stage));
    }

    fn finish(
        &self,
        ctx: RunContext,
        status: RunStatus,
        message: String,
        percent: u8,
    ) -> RunSummary {
        let stage = self.snapshot_stage();
        let final_status = status.clone();
        self.update(|run| run.status = final_status);
        self.sink
            .publish(ProgressEvent::new(stage, status.clone(), message, percent));

        RunSummary {
            video: ctx.video,
            status,
            impacts: ctx.impacts,
            metadata: ctx.metadata,
            captured: ctx.captured,
            failed_captures: ctx.failed_captures,
            screenshot_dir: ctx.outputs.map(|o| o.screenshot_dir),
            manifest: ctx.manifest,
        }
    }

    fn snapshot_stage(&self) -> Stage {
        self.state
            .read()
            .map(|run| run.stage)
            .unwrap_or(Stage::Idle)
    }

    fn update<F: FnOnce(&mut PipelineRun)>(&self, f: F) {
        if let Ok(mut run) = self.state.write() {
            f(&mut run);
        }
    }

    fn log(&self, message: std::fmt::Arguments<'_>) {
        if self.verbosity >= 1 && !self.quiet {
            clear_line();
            eprintln!("{}", message);
        }
    }
}

/// Builds and runs coordinators with a shared executor and reporter.
pub struct Pipeline {
    config: PipelineConfig,
    executor: Arc<dyn CommandExecutor>,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a pipeline that runs the real decoder.
    pub fn new(config: PipelineConfig) -> Self {
        let echo = config.verbosity >= 2 && !config.quiet;
        let reporter = LogReporter::new(config.verbosity, config.quiet);
        Self {
            config,
            executor: Arc::new(SystemCommandExecutor::new().with_echo(echo)),
            error_reporter: Arc::new(reporter),
        }
    }

    /// Sets a custom command executor (for testing without ffmpeg).
    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run on the calling thread, publishing progress to `sink`.
    pub fn run(&self, video: &Path, sink: Arc<dyn ProgressSink>) -> RunSummary {
        let state = Arc::new(RwLock::new(PipelineRun::new(video.to_path_buf())));
        self.run_with_state(video, sink, state)
    }

    fn run_with_state(
        &self,
        video: &Path,
        sink: Arc<dyn ProgressSink>,
        state: Arc<RwLock<PipelineRun>>,
    ) -> RunSummary {
        let coordinator = Coordinator::new(
            &self.config,
            self.executor.clone(),
            sink.clone(),
            self.error_reporter.clone(),
            state.clone(),
        );

        match panic::catch_unwind(AssertUnwindSafe(|| coordinator.run(video))) {
            Ok(summary) => summary,
            Err(panic_info) => {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                    .unwrap_or("unknown panic");
                let reason = format!("pipeline worker panicked: {}", msg);
                self.error_reporter
                    .report("pipeline", &StageError::Fatal(reason.clone()));
                panicked_summary(video, &state, &*sink, reason)
            }
        }
    }

    /// Start the run on a background worker thread.
    pub fn spawn(self, video: PathBuf) -> Result<PipelineHandle> {
        let (tx, rx) = unbounded();
        let state = Arc::new(RwLock::new(PipelineRun::new(video.clone())));
        let worker_state = state.clone();

        let worker = thread::Builder::new()
            .name("hawkeye-pipeline".to_string())
            .spawn(move || {
                let sink: Arc<dyn ProgressSink> = Arc::new(ChannelSink::new(tx));
                self.run_with_state(&video, sink, worker_state)
            })?;

        Ok(PipelineHandle {
            progress: rx,
            state,
            worker,
        })
    }
}

fn panicked_summary(
    video: &Path,
    state: &RwLock<PipelineRun>,
    sink: &dyn ProgressSink,
    reason: String,
) -> RunSummary {
    let status = RunStatus::Failed(reason.clone());
    let run = match state.write() {
        Ok(mut run) => {
            run.status = status.clone();
            run.clone()
        }
        Err(poisoned) => {
            let mut run = poisoned.into_inner();
            run.status = status.clone();
            run.clone()
        }
    };
    sink.publish(ProgressEvent::new(
        run.stage,
        status.clone(),
        format!("Error: {}", reason),
        defaults::PERCENT_FAILED,
    ));

    RunSummary {
        video: video.to_path_buf(),
        status,
        impacts: run.impacts,
        metadata: run.metadata,
        captured: Vec::new(),
        failed_captures: Vec::new(),
        screenshot_dir: None,
        manifest: None,
    }
}

/// Handle to a pipeline running on its worker thread.
pub struct PipelineHandle {
    progress: Receiver<ProgressEvent>,
    state: Arc<RwLock<PipelineRun>>,
    worker: JoinHandle<RunSummary>,
}

impl PipelineHandle {
    /// Progress events in publication order. The last one is terminal.
    pub fn progress(&self) -> &Receiver<ProgressEvent> {
        &self.progress
    }

    /// Copy of the run state as of now.
    pub fn snapshot(&self) -> PipelineRun {
        match self.state.read() {
            Ok(run) => run.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Block until the worker finishes and return its summary.
    pub fn wait(self) -> RunSummary {
        let fallback = self.snapshot();
        match self.worker.join() {
            Ok(summary) => summary,
            Err(_) => RunSummary {
                video: fallback.video,
                status: RunStatus::Failed("pipeline worker panicked".to_string()),
                impacts: fallback.impacts,
                metadata: fallback.metadata,
                captured: Vec::new(),
                failed_captures: Vec::new(),
                screenshot_dir: None,
                manifest: None,
            },
        }
    }
}
