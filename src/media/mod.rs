//! Adapters around the external media tool (ffmpeg).
//!
//! Extraction, probing and capture are thin shims over a
//! [`CommandExecutor`]; none of them decode media in-process.

pub mod capture;
pub mod executor;
pub mod extract;
pub mod probe;

pub use capture::{FrameCapturer, capture_time, screenshot_name};
pub use executor::{CommandExecutor, CommandOutput, MockCommandExecutor, SystemCommandExecutor};
pub use extract::{AudioExtractor, ExtractedAudio};
pub use probe::{VideoMetadata, VideoProber, parse_frame_rate};
