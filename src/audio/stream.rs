//! Decoded PCM audio held in memory for whole-file analysis.

use crate::error::{HawkeyeError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Layout of the interleaved PCM bytes in a [`SampleStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Bytes from the start of one frame to the start of the next.
    pub frame_stride: usize,
    /// Interleaved channels per frame.
    pub channels: u16,
}

impl AudioFormat {
    /// Format for interleaved signed 16-bit PCM.
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            frame_stride: usize::from(channels) * 2,
            channels,
        }
    }
}

/// Raw little-endian PCM bytes plus the format needed to walk them.
#[derive(Debug, Clone)]
pub struct SampleStream {
    data: Vec<u8>,
    format: AudioFormat,
}

impl SampleStream {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    /// Build a stream from interleaved 16-bit samples.
    pub fn from_samples(samples: &[i16], sample_rate: u32, channels: u16) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(data, AudioFormat::pcm16(sample_rate, channels))
    }

    /// Parse a 16-bit integer WAV file.
    pub fn from_wav_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| HawkeyeError::AudioRead {
            message: format!("Cannot open {}: {}", path.display(), e),
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse 16-bit integer WAV data from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| HawkeyeError::AudioRead {
            message: format!("Failed to parse WAV data: {}", e),
        })?;

        let spec = wav_reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(HawkeyeError::AudioFormat {
                message: format!(
                    "expected 16-bit integer PCM, got {}-bit {:?}",
                    spec.bits_per_sample, spec.sample_format
                ),
            });
        }
        if spec.sample_rate == 0 || spec.channels == 0 {
            return Err(HawkeyeError::AudioFormat {
                message: format!(
                    "invalid header: {} Hz, {} channel(s)",
                    spec.sample_rate, spec.channels
                ),
            });
        }

        let samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HawkeyeError::AudioRead {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        Ok(Self::from_samples(&samples, spec.sample_rate, spec.channels))
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Number of whole frames in the stream.
    pub fn frame_count(&self) -> usize {
        if self.format.frame_stride == 0 {
            return 0;
        }
        self.data.len() / self.format.frame_stride
    }

    /// Signed 16-bit amplitude at the first channel position of frame `index`.
    ///
    /// Reads the two bytes at `index * frame_stride`, low byte first. Returns 0
    /// when those bytes lie past the end of the buffer.
    pub fn amplitude(&self, index: usize) -> i16 {
        let offset = index.saturating_mul(self.format.frame_stride);
        match self.data.get(offset..offset.saturating_add(2)) {
            Some(&[lo, hi]) => i16::from_le_bytes([lo, hi]),
            _ => 0,
        }
    }

    /// Total duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / f64::from(self.format.sample_rate)
    }
}
