//! Application entry points for the command line.
//!
//! Wires configuration, video selection and the pipeline together:
//! choose video → extract → detect → probe → capture

use crate::audio::detector::{DetectorConfig, ImpactDetector, ImpactEvent};
use crate::audio::stream::SampleStream;
use crate::config::{Config, OutputPolicy};
use crate::error::Result;
use crate::output::render_progress;
use crate::pipeline::coordinator::{Pipeline, PipelineConfig};
use crate::pipeline::progress::latest;
use crate::pipeline::types::RunSummary;
use crossbeam_channel::RecvTimeoutError;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROGRESS_POLL: Duration = Duration::from_millis(100);

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub decoder: Option<String>,
    pub screenshot_dir: Option<PathBuf>,
    pub frames_dir: Option<PathBuf>,
    pub offset: Option<f64>,
    pub per_run: bool,
    /// Applies to probe and capture calls
    pub timeout_secs: Option<u64>,
}

impl RunOverrides {
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(decoder) = &self.decoder {
            config.decoder.path = decoder.clone();
        }
        if let Some(dir) = &self.screenshot_dir {
            config.capture.screenshot_dir = dir.clone();
        }
        if let Some(dir) = &self.frames_dir {
            config.capture.frames_dir = dir.clone();
        }
        if let Some(offset) = self.offset {
            config.capture.acoustic_offset_secs = offset;
        }
        if self.per_run {
            config.capture.output_policy = OutputPolicy::PerRun;
        }
        if let Some(secs) = self.timeout_secs {
            config.decoder.probe_timeout_secs = secs;
            config.decoder.capture_timeout_secs = secs;
        }
        config
    }
}

/// Pick the video to analyse.
///
/// Order: explicit path, then the configured default if it exists, then an
/// interactive prompt when stdin is a terminal. `None` means the user
/// declined.
pub fn select_video(explicit: Option<PathBuf>, config: &Config, quiet: bool) -> Option<PathBuf> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    select_video_from(
        explicit,
        &config.video.default_path,
        interactive && !quiet,
        stdin.lock(),
    )
}

fn select_video_from<R: BufRead>(
    explicit: Option<PathBuf>,
    default_path: &Path,
    interactive: bool,
    mut input: R,
) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    if !default_path.as_os_str().is_empty() && default_path.exists() {
        return Some(default_path.to_path_buf());
    }
    if !interactive {
        return None;
    }

    eprint!("Video file to analyse (empty to cancel): ");
    io::stderr().flush().ok();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let answer = line.trim();
            if answer.is_empty() {
                None
            } else {
                Some(PathBuf::from(answer))
            }
        }
    }
}

/// Run the full pipeline on `video`, rendering progress on stderr.
///
/// Returns the run summary; a failed run is still `Ok` here. Only
/// configuration problems and a failure to start the worker are errors.
pub fn run_video_command(
    config: &Config,
    video: PathBuf,
    quiet: bool,
    verbosity: u8,
) -> Result<RunSummary> {
    config.validate()?;

    let mut pipeline_config = PipelineConfig::from_config(config);
    pipeline_config.quiet = quiet;
    pipeline_config.verbosity = verbosity;

    if !quiet && verbosity >= 1 {
        eprintln!("hawkeye {}", crate::version_string());
        eprintln!("Selected video: {}", video.display());
        eprintln!(
            "Decoder: {} (offset {:.3}s)",
            pipeline_config.decoder, pipeline_config.acoustic_offset_secs
        );
    }

    let handle = Pipeline::new(pipeline_config).spawn(video)?;

    loop {
        match handle.progress().recv_timeout(PROGRESS_POLL) {
            Ok(event) => {
                // Only the newest state matters for display
                let event = latest(handle.progress()).unwrap_or(event);
                if !quiet {
                    render_progress(&event);
                }
                if event.is_terminal() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if handle.is_finished() && handle.progress().is_empty() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(handle.wait())
}

/// Run only the impact detector over a 16-bit PCM WAV file.
pub fn run_detect_command(config: &Config, wav: &Path) -> Result<Vec<ImpactEvent>> {
    config.validate()?;
    let stream = SampleStream::from_wav_file(wav)?;
    let detector = ImpactDetector::new(DetectorConfig {
        threshold_ratio: config.detection.threshold_ratio,
        refractory_ms: config.detection.refractory_ms,
    });
    Ok(detector.detect(&stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn overrides_replace_config_values() {
        let overrides = RunOverrides {
            decoder: Some("/opt/ffmpeg".to_string()),
            screenshot_dir: Some(PathBuf::from("shots")),
            frames_dir: Some(PathBuf::from("scratch")),
            offset: Some(0.12),
            per_run: true,
            timeout_secs: Some(5),
        };
        let config = overrides.apply(Config::default());

        assert_eq!(config.decoder.path, "/opt/ffmpeg");
        assert_eq!(config.capture.screenshot_dir, PathBuf::from("shots"));
        assert_eq!(config.capture.frames_dir, PathBuf::from("scratch"));
        assert_eq!(config.capture.acoustic_offset_secs, 0.12);
        assert_eq!(config.capture.output_policy, OutputPolicy::PerRun);
        assert_eq!(config.decoder.probe_timeout_secs, 5);
        assert_eq!(config.decoder.capture_timeout_secs, 5);
        assert_eq!(config.decoder.extract_timeout_secs, 30);
    }

    #[test]
    fn empty_overrides_keep_config() {
        let config = RunOverrides::default().apply(Config::default());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn explicit_video_wins() {
        let chosen = select_video_from(
            Some(PathBuf::from("final.mp4")),
            Path::new("test_17.mp4"),
            true,
            Cursor::new("other.mp4\n"),
        );
        assert_eq!(chosen, Some(PathBuf::from("final.mp4")));
    }

    #[test]
    fn existing_default_is_used_without_prompt() {
        let file = NamedTempFile::new().unwrap();
        let chosen = select_video_from(None, file.path(), false, Cursor::new(""));
        assert_eq!(chosen, Some(file.path().to_path_buf()));
    }

    #[test]
    fn missing_default_prompts_when_interactive() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("test_17.mp4");
        let chosen = select_video_from(None, &missing, true, Cursor::new("  rally.mp4 \n"));
        assert_eq!(chosen, Some(PathBuf::from("rally.mp4")));
    }

    #[test]
    fn empty_answer_declines() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("test_17.mp4");
        assert_eq!(select_video_from(None, &missing, true, Cursor::new("\n")), None);
        assert_eq!(select_video_from(None, &missing, true, Cursor::new("")), None);
    }

    #[test]
    fn non_interactive_without_default_declines() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("test_17.mp4");
        assert_eq!(
            select_video_from(None, &missing, false, Cursor::new("rally.mp4\n")),
            None
        );
    }

    #[test]
    fn detect_command_finds_strikes_in_wav() {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(file.path(), spec).unwrap();
        for i in 0..16_000u32 {
            let sample: i16 = if i == 4000 || i == 12_000 { 15_000 } else { 0 };
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let events = run_detect_command(&Config::default(), file.path()).unwrap();
        let times: Vec<f64> = events.iter().map(|e| e.timestamp_secs).collect();
        assert_eq!(times, vec![0.5, 1.5]);
    }

    #[test]
    fn detect_command_rejects_invalid_config() {
        let mut config = Config::default();
        config.detection.threshold_ratio = 0.0;
        assert!(run_detect_command(&config, Path::new("missing.wav")).is_err());
    }

    #[test]
    fn detect_command_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = run_detect_command(&Config::default(), &dir.path().join("missing.wav"));
        assert!(result.is_err());
    }
}
