//! Stage failures and the sink they are handed to.
//!
//! A run never aborts on a skippable failure (one missed frame, an
//! unreadable frame rate); it records the problem and keeps going. A fatal
//! failure ends the run with [`RunStatus::Failed`](crate::pipeline::types::RunStatus).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// Recorded, then the stage carries on with a fallback or the next item.
    #[error("skipped: {0}")]
    Skippable(String),
    /// No later stage executes.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl StageError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageError::Fatal(_))
    }

    pub fn message(&self) -> &str {
        match self {
            StageError::Skippable(msg) | StageError::Fatal(msg) => msg,
        }
    }
}

/// Receives every stage failure of a run, tagged with the stage name.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, stage: &str, error: &StageError);
}

/// Writes stage failures to stderr in verbose mode.
///
/// Silent by default: the run summary already lists the failure reason and
/// every frame that was not captured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter {
    verbosity: u8,
    quiet: bool,
}

impl LogReporter {
    pub fn new(verbosity: u8, quiet: bool) -> Self {
        Self { verbosity, quiet }
    }

    /// The stderr line for `error`, or `None` when this reporter is silent.
    pub fn render(&self, stage: &str, error: &StageError) -> Option<String> {
        (self.verbosity >= 1 && !self.quiet).then(|| format!("[{}] {}", stage, error))
    }
}

impl ErrorReporter for LogReporter {
    fn report(&self, stage: &str, error: &StageError) {
        if let Some(line) = self.render(stage, error) {
            eprintln!("{}", line);
        }
    }
}
