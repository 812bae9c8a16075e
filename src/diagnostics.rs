//! System diagnostics and dependency checking.
//!
//! Verifies that the external decoder is installed and runs.

use crate::error::HawkeyeError;
use crate::media::executor::CommandExecutor;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working; carries its version banner
    Ok(String),
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// Run `<decoder> -version` and classify the outcome.
pub fn check_decoder(executor: &dyn CommandExecutor, decoder: &str) -> CheckResult {
    match executor.execute(decoder, &["-version".to_string()], CHECK_TIMEOUT) {
        Ok(output) if output.is_success() => {
            let banner = output.lines.first().cloned().unwrap_or_default();
            CheckResult::Ok(banner)
        }
        Ok(output) => CheckResult::Warning(format!(
            "'{}' found but -version exited with {}",
            decoder,
            output
                .code
                .map_or_else(|| "a signal".to_string(), |c| c.to_string())
        )),
        Err(HawkeyeError::DecoderNotFound { .. }) => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", decoder, e)),
    }
}

/// Run all dependency checks and print results. Returns `true` when the
/// decoder is usable.
pub fn check_dependencies(executor: &dyn CommandExecutor, decoder: &str) -> bool {
    println!("Checking system dependencies...\n");

    print!("{} (audio extraction, frame capture): ", decoder);
    match check_decoder(executor, decoder) {
        CheckResult::Ok(banner) => {
            println!("✓ OK");
            if !banner.is_empty() {
                println!("  {}", banner);
            }
            true
        }
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install: sudo apt install ffmpeg  (Debian/Ubuntu)");
            println!("           sudo pacman -S ffmpeg    (Arch)");
            println!("           brew install ffmpeg      (macOS)");
            println!("  Or point [decoder] path / HAWKEYE_DECODER at an ffmpeg binary.");
            false
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {}", msg);
            false
        }
    }
}
