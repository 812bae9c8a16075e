//! Still-frame capture at delay-compensated impact times.

use crate::audio::detector::ImpactEvent;
use crate::error::{HawkeyeError, Result};
use crate::media::executor::CommandExecutor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Seek position for an impact heard at `timestamp_secs`, never negative.
pub fn capture_time(timestamp_secs: f64, acoustic_offset_secs: f64) -> f64 {
    (timestamp_secs - acoustic_offset_secs).max(0.0)
}

/// File name for the screenshot of an impact, keyed by the uncompensated
/// timestamp at millisecond precision.
pub fn screenshot_name(timestamp_secs: f64) -> String {
    format!("impact_{:.3}.png", timestamp_secs)
}

/// Grabs one frame per impact through the decoder.
pub struct FrameCapturer {
    decoder: String,
    timeout: Duration,
    acoustic_offset_secs: f64,
    executor: Arc<dyn CommandExecutor>,
}

impl FrameCapturer {
    pub fn new(
        decoder: impl Into<String>,
        timeout: Duration,
        acoustic_offset_secs: f64,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            decoder: decoder.into(),
            timeout,
            acoustic_offset_secs,
            executor,
        }
    }

    pub fn acoustic_offset_secs(&self) -> f64 {
        self.acoustic_offset_secs
    }

    /// Decoder arguments grabbing the frame at `seek_secs` into `output`.
    pub fn args(video: &Path, seek_secs: f64, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-ss".to_string(),
            format!("{:.3}", seek_secs),
            "-vframes".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            "format=yuv420p".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            "-f".to_string(),
            "image2".to_string(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    /// Capture the frame for `event` into `dir`, returning the image path.
    pub fn capture(&self, video: &Path, event: &ImpactEvent, dir: &Path) -> Result<PathBuf> {
        let seek = capture_time(event.timestamp_secs, self.acoustic_offset_secs);
        let output_path = dir.join(screenshot_name(event.timestamp_secs));

        let output = self.executor.execute(
            &self.decoder,
            &Self::args(video, seek, &output_path),
            self.timeout,
        )?;

        if !output.is_success() {
            return Err(HawkeyeError::DecoderFailed {
                tool: self.decoder.clone(),
                message: format!(
                    "frame at {:.3}s not captured (exit code {:?})",
                    seek, output.code
                ),
            });
        }

        Ok(output_path)
    }
}
