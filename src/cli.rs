//! Command-line interface for hawkeye
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Find ball-strike impacts in a squash video and capture the matching frames
#[derive(Parser, Debug)]
#[command(
    name = "hawkeye",
    version,
    about = "Find ball-strike impacts in a squash video and capture the matching frames",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video to analyse (default: [video] default_path, else prompt)
    #[arg(value_name = "VIDEO")]
    pub video: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-impact detail, -vv: decoder output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decoder executable (default: ffmpeg)
    #[arg(long, global = true, value_name = "PATH")]
    pub decoder: Option<String>,

    /// Directory for impact screenshots
    #[arg(long, value_name = "DIR")]
    pub screenshot_dir: Option<PathBuf>,

    /// Scratch directory for frames
    #[arg(long, value_name = "DIR")]
    pub frames_dir: Option<PathBuf>,

    /// Seconds subtracted from each impact before capture (default: 0.09)
    #[arg(long, value_name = "SECS")]
    pub offset: Option<f64>,

    /// Keep earlier screenshots; write into a fresh run-<millis> subdirectory
    #[arg(long)]
    pub per_run: bool,

    /// Deadline for each probe and capture call. Examples: 30s, 2m, 1m30s
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout_secs)]
    pub timeout: Option<u64>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Parse a timeout string into whole seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`), and compound (`1m30s`). Zero is rejected.
fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let secs = match s.parse::<u64>() {
        Ok(secs) => secs,
        Err(_) => humantime::parse_duration(s)
            .map(|d| d.as_secs())
            .map_err(|e| e.to_string())?,
    };
    if secs == 0 {
        return Err("timeout must be at least one second".to_string());
    }
    Ok(secs)
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run impact detection on a 16-bit PCM WAV file and print timestamps
    Detect {
        /// WAV file to analyse
        #[arg(value_name = "WAV")]
        wav: PathBuf,
    },

    /// Check system dependencies
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_command() {
        let cli = Cli::try_parse_from(["hawkeye"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.video.is_none());
        assert!(cli.decoder.is_none());
        assert!(cli.screenshot_dir.is_none());
        assert!(cli.frames_dir.is_none());
        assert!(cli.offset.is_none());
        assert!(cli.timeout.is_none());
        assert!(!cli.per_run);
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_video_argument() {
        let cli = Cli::try_parse_from(["hawkeye", "match.mp4"]).unwrap();
        assert_eq!(cli.video, Some(PathBuf::from("match.mp4")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["hawkeye", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_with_options() {
        let cli = Cli::try_parse_from([
            "hawkeye",
            "--decoder",
            "/opt/ffmpeg/bin/ffmpeg",
            "--screenshot-dir",
            "shots",
            "--frames-dir",
            "scratch",
            "--offset",
            "0.12",
            "--per-run",
            "--json",
            "match.mp4",
        ])
        .unwrap();

        assert_eq!(cli.decoder.as_deref(), Some("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(cli.screenshot_dir, Some(PathBuf::from("shots")));
        assert_eq!(cli.frames_dir, Some(PathBuf::from("scratch")));
        assert_eq!(cli.offset, Some(0.12));
        assert!(cli.per_run);
        assert!(cli.json);
        assert_eq!(cli.video, Some(PathBuf::from("match.mp4")));
    }

    #[test]
    fn test_parse_timeout_formats() {
        assert_eq!(parse_timeout_secs("45"), Ok(45));
        assert_eq!(parse_timeout_secs("30s"), Ok(30));
        assert_eq!(parse_timeout_secs("2m"), Ok(120));
        assert_eq!(parse_timeout_secs("1m30s"), Ok(90));
        assert_eq!(parse_timeout_secs(" 10s "), Ok(10));
    }

    #[test]
    fn test_parse_timeout_rejects_zero_and_garbage() {
        assert!(parse_timeout_secs("0").is_err());
        assert!(parse_timeout_secs("0s").is_err());
        assert!(parse_timeout_secs("soon").is_err());
        assert!(Cli::try_parse_from(["hawkeye", "--timeout", "never"]).is_err());
    }

    #[test]
    fn test_parse_timeout_flag() {
        let cli = Cli::try_parse_from(["hawkeye", "--timeout", "2m"]).unwrap();
        assert_eq!(cli.timeout, Some(120));
    }

    #[test]
    fn test_parse_detect() {
        let cli = Cli::try_parse_from(["hawkeye", "detect", "rally.wav"]).unwrap();
        match cli.command {
            Some(Commands::Detect { wav }) => assert_eq!(wav, PathBuf::from("rally.wav")),
            other => panic!("Expected Detect command, got {:?}", other),
        }
    }

    #[test]
    fn test_detect_requires_file() {
        assert!(Cli::try_parse_from(["hawkeye", "detect"]).is_err());
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["hawkeye", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["hawkeye", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completions { shell: Shell::Bash })
        ));
    }

    #[test]
    fn test_global_options_after_command() {
        let cli = Cli::try_parse_from(["hawkeye", "check", "--decoder", "avconv", "-q"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert_eq!(cli.decoder.as_deref(), Some("avconv"));
        assert!(cli.quiet);
    }

    #[test]
    fn test_invalid_offset_returns_error() {
        assert!(Cli::try_parse_from(["hawkeye", "--offset", "abc"]).is_err());
    }

    #[test]
    fn test_help_flag() {
        let result = Cli::try_parse_from(["hawkeye", "--help"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), clap::error::ErrorKind::DisplayHelp);
        }
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["hawkeye", "--version"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), clap::error::ErrorKind::DisplayVersion);
        }
    }
}
