//! Default configuration constants for hawkeye.
//!
//! Shared by the config layer, the CLI and the pipeline so that a value
//! only ever has one definition.

/// Fraction of the global peak a sample must exceed to count as an impact.
pub const THRESHOLD_RATIO: f64 = 0.7;

/// Minimum gap between two accepted impacts, in milliseconds.
///
/// 200ms is shorter than any real rally exchange but long enough to swallow
/// the ringing that follows a single strike.
pub const REFRACTORY_MS: u32 = 200;

/// Seconds subtracted from an impact timestamp before grabbing its frame.
///
/// Models the time sound takes to travel from the racket to the microphone
/// (roughly 30m at 343m/s).
pub const ACOUSTIC_OFFSET_SECS: f64 = 0.09;

/// Frame rate reported when the decoder output cannot be parsed.
pub const FRAME_RATE: f64 = 25.0;

/// External media tool used for every decode, probe and capture.
pub const DECODER: &str = "ffmpeg";

/// Deadline for decoding the audio track.
pub const EXTRACT_TIMEOUT_SECS: u64 = 30;

/// Deadline for the frame-rate probe.
pub const PROBE_TIMEOUT_SECS: u64 = 30;

/// Deadline for each single-frame capture.
pub const CAPTURE_TIMEOUT_SECS: u64 = 30;

/// Sample rate requested from the decoder for the extracted track.
pub const EXTRACT_SAMPLE_RATE: u32 = 44100;

/// Channel count requested from the decoder for the extracted track.
pub const EXTRACT_CHANNELS: u16 = 2;

/// Directory receiving one screenshot per impact.
pub const SCREENSHOT_DIR: &str = "impact_screenshots";

/// Scratch frame directory, purged alongside the screenshots.
pub const FRAMES_DIR: &str = "frames";

/// Video analysed when none is given on the command line.
pub const VIDEO_PATH: &str = "test_17.mp4";

/// Progress percentages for each stage, in pipeline order.
pub const PERCENT_EXTRACTING: u8 = 10;
pub const PERCENT_DETECTING: u8 = 40;
pub const PERCENT_NO_IMPACTS: u8 = 50;
pub const PERCENT_PROBING: u8 = 60;
pub const PERCENT_CAPTURING: u8 = 80;
pub const PERCENT_DONE: u8 = 100;
pub const PERCENT_FAILED: u8 = 0;
