//! Impact pipeline for one video.
//!
//! A single worker thread runs the stages in order and publishes progress
//! over a crossbeam channel; readers poll it or take state snapshots.

pub mod coordinator;
pub mod error;
pub mod outputs;
pub mod progress;
pub mod types;

pub use coordinator::{Coordinator, EXTRACTION_FAILED, Pipeline, PipelineConfig, PipelineHandle};
pub use error::{ErrorReporter, LogReporter, StageError};
pub use outputs::{ImpactManifest, MANIFEST_FILE, ManifestEntry, OutputDirs, PreparedOutputs};
pub use progress::{ChannelSink, CollectorSink, NullSink, ProgressSink, latest};
pub use types::{CapturedFrame, PipelineRun, ProgressEvent, RunStatus, RunSummary, Stage};
