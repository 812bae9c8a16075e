//! hawkeye - squash impact finder
//!
//! Listens to a match video's soundtrack for ball strikes and captures the
//! video frame at each one, compensating for the sound's travel time.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod error;
pub mod media;
pub mod output;
pub mod pipeline;

// Composition root
#[cfg(feature = "cli")]
pub mod app;

// Detection
pub use audio::detector::{DetectorConfig, ImpactDetector, ImpactEvent};
pub use audio::stream::{AudioFormat, SampleStream};

// Decoder adapters
pub use media::executor::{CommandExecutor, CommandOutput, SystemCommandExecutor};

// Pipeline
pub use pipeline::coordinator::{Pipeline, PipelineConfig, PipelineHandle};
pub use pipeline::progress::{ChannelSink, CollectorSink, ProgressSink};
pub use pipeline::types::{ProgressEvent, RunStatus, RunSummary, Stage};

// Error handling
pub use error::{HawkeyeError, Result};

// Config
pub use config::{Config, OutputPolicy};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
