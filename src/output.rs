//! Terminal rendering of pipeline progress.
//! Used by the default run command; everything goes to stderr.

use crate::pipeline::types::{ProgressEvent, RunStatus};
use std::io::{self, Write};

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const BAR_WIDTH: usize = 20;

/// Clear the current terminal line (replaces the progress bar).
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Fixed-width bar for a percentage, e.g. `[#####...............]`.
pub fn format_progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Single progress line without colors.
pub fn format_progress(event: &ProgressEvent) -> String {
    format!(
        "{} {:>3}% {}",
        format_progress_bar(event.percent),
        event.percent,
        event.message
    )
}

/// Render a progress event to stderr.
///
/// Running events overwrite the current line so only the latest one is
/// visible; the terminal event ends the line.
pub fn render_progress(event: &ProgressEvent) {
    let line = format_progress(event);
    match &event.status {
        RunStatus::Succeeded => eprintln!("\r\x1b[2K{GREEN}{line}{RESET}"),
        RunStatus::SkippedEmpty => eprintln!("\r\x1b[2K{YELLOW}{line}{RESET}"),
        RunStatus::Failed(_) => eprintln!("\r\x1b[2K{RED}{line}{RESET}"),
        RunStatus::Pending | RunStatus::Running => {
            eprint!("\r\x1b[2K{DIM}{line}{RESET}");
            io::stderr().flush().ok();
        }
    }
}
