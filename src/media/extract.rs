//! Audio extraction: decode a video's soundtrack to a temporary WAV file.

use crate::audio::stream::SampleStream;
use crate::defaults;
use crate::error::{HawkeyeError, Result};
use crate::media::executor::CommandExecutor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Decoded soundtrack on disk. The file is removed when this value drops.
#[derive(Debug)]
pub struct ExtractedAudio {
    file: NamedTempFile,
    size: u64,
}

impl ExtractedAudio {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size in bytes as reported after extraction.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Parse the decoded file into memory.
    pub fn load(&self) -> Result<SampleStream> {
        SampleStream::from_wav_file(self.path())
    }
}

/// Runs the decoder to produce 44.1 kHz, 16-bit, stereo PCM.
pub struct AudioExtractor {
    decoder: String,
    timeout: Duration,
    executor: Arc<dyn CommandExecutor>,
}

impl AudioExtractor {
    pub fn new(decoder: impl Into<String>, timeout: Duration, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            decoder: decoder.into(),
            timeout,
            executor,
        }
    }

    /// Decoder arguments for extracting `video` into `output`.
    pub fn args(video: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            defaults::EXTRACT_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            defaults::EXTRACT_CHANNELS.to_string(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    /// Extract the soundtrack of `video`.
    ///
    /// Succeeds only if the decoder exits with code 0 before the deadline and
    /// leaves a non-empty file behind.
    pub fn extract(&self, video: &Path) -> Result<ExtractedAudio> {
        let file = tempfile::Builder::new()
            .prefix("extracted_audio")
            .suffix(".wav")
            .tempfile()?;

        let output = self
            .executor
            .execute(&self.decoder, &Self::args(video, file.path()), self.timeout)?;

        if !output.is_success() {
            let tail = output.lines.last().cloned().unwrap_or_default();
            return Err(HawkeyeError::DecoderFailed {
                tool: self.decoder.clone(),
                message: match output.code {
                    Some(code) => format!("exit code {}: {}", code, tail),
                    None => format!("terminated by signal: {}", tail),
                },
            });
        }

        let size = std::fs::metadata(file.path()).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(HawkeyeError::DecoderFailed {
                tool: self.decoder.clone(),
                message: format!("no audio written to {}", file.path().display()),
            });
        }

        Ok(ExtractedAudio { file, size })
    }
}
