//! Frame-rate discovery from the decoder's diagnostic output.

use crate::defaults;
use crate::error::Result;
use crate::media::executor::CommandExecutor;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Facts about the source video. Always carries a frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub frame_rate: f64,
    /// False when `frame_rate` is the fallback value.
    pub frame_rate_detected: bool,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            frame_rate: defaults::FRAME_RATE,
            frame_rate_detected: false,
        }
    }
}

/// Find the frame rate in decoder info output.
///
/// Only lines containing `" fps,"` are considered. Within them a token
/// `<number>fps`, or a number directly followed by a standalone `fps` token,
/// is a candidate; the first candidate that parses to a positive value wins.
pub fn parse_frame_rate<S: AsRef<str>>(lines: &[S]) -> Option<f64> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| line.contains(" fps,"))
        .find_map(|line| {
            let tokens: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .collect();
            tokens.iter().enumerate().find_map(|(i, token)| {
                if !token.ends_with("fps") {
                    return None;
                }
                let digits = numeric_part(token);
                if !digits.is_empty() {
                    return parse_positive(&digits);
                }
                i.checked_sub(1)
                    .and_then(|prev| parse_positive(&numeric_part(tokens[prev])))
            })
        })
}

fn numeric_part(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

fn parse_positive(digits: &str) -> Option<f64> {
    digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Runs the decoder in info mode and extracts the frame rate.
pub struct VideoProber {
    decoder: String,
    timeout: Duration,
    executor: Arc<dyn CommandExecutor>,
}

impl VideoProber {
    pub fn new(decoder: impl Into<String>, timeout: Duration, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            decoder: decoder.into(),
            timeout,
            executor,
        }
    }

    /// Probe `video`. Never fails: any problem yields the default frame rate.
    pub fn probe(&self, video: &Path) -> VideoMetadata {
        self.try_probe(video).unwrap_or_default()
    }

    /// Like [`probe`](Self::probe), but hands back a decoder that could not
    /// be run or missed its deadline.
    ///
    /// The decoder exits non-zero in info mode (no output file is given), so
    /// the exit code is ignored; output without a rate is the fallback, not
    /// an error.
    pub fn try_probe(&self, video: &Path) -> Result<VideoMetadata> {
        let args = vec!["-i".to_string(), video.to_string_lossy().into_owned()];
        let output = self.executor.execute(&self.decoder, &args, self.timeout)?;
        Ok(match parse_frame_rate(&output.lines) {
            Some(frame_rate) => VideoMetadata {
                frame_rate,
                frame_rate_detected: true,
            },
            None => VideoMetadata::default(),
        })
    }
}
