use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use hawkeye::app::{RunOverrides, run_detect_command, run_video_command, select_video};
use hawkeye::cli::{Cli, Commands};
use hawkeye::config::Config;
use hawkeye::diagnostics::check_dependencies;
use hawkeye::media::executor::SystemCommandExecutor;
use hawkeye::pipeline::types::{RunStatus, RunSummary};
use owo_colors::OwoColorize;
use std::path::Path;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let overrides = RunOverrides {
                decoder: cli.decoder,
                screenshot_dir: cli.screenshot_dir,
                frames_dir: cli.frames_dir,
                offset: cli.offset,
                per_run: cli.per_run,
                timeout_secs: cli.timeout,
            };
            let config = overrides.apply(load_config(cli.config.as_deref())?);

            let Some(video) = select_video(cli.video, &config, cli.quiet) else {
                eprintln!("No video selected");
                return Ok(ExitCode::FAILURE);
            };

            let summary = run_video_command(&config, video, cli.quiet, cli.verbose)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if !cli.quiet {
                print_summary(&summary);
            }

            if summary.status.is_ok() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Some(Commands::Detect { wav }) => {
            let config = load_config(cli.config.as_deref())?;
            let events = run_detect_command(&config, &wav)
                .with_context(|| format!("cannot analyse {}", wav.display()))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                if !cli.quiet {
                    eprintln!("No impacts detected in the audio.");
                }
            } else {
                for event in &events {
                    println!("{:.3}", event.timestamp_secs);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Check) => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(decoder) = cli.decoder {
                config.decoder.path = decoder;
            }
            let executor = SystemCommandExecutor::new();
            if check_dependencies(&executor, &config.decoder.path) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "hawkeye", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/hawkeye/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path).with_context(|| format!("cannot load {}", path.display()))?
    } else {
        match Config::default_path() {
            Some(default_path) => Config::load_or_default(&default_path)?,
            None => Config::default(),
        }
    };

    Ok(config.with_env_overrides())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{} {}", "Video:".bold(), summary.video.display());
    println!(
        "{} {} fps{}",
        "Frame rate:".bold(),
        summary.metadata.frame_rate,
        if summary.metadata.frame_rate_detected {
            ""
        } else {
            " (default)"
        }
    );

    match &summary.status {
        RunStatus::Succeeded => {
            println!("{} {}", "Impacts:".bold(), summary.impacts.len());
            for frame in &summary.captured {
                println!(
                    "  {} {:.3}s {} {}",
                    "✓".green(),
                    frame.timestamp_secs,
                    "→".dimmed(),
                    frame.path.display()
                );
            }
            for timestamp in &summary.failed_captures {
                println!("  {} {:.3}s not captured", "✗".red(), timestamp);
            }
            if let Some(dir) = &summary.screenshot_dir {
                println!("{} {}", "Screenshots:".bold(), dir.display());
            }
            if let Some(manifest) = &summary.manifest {
                println!("{} {}", "Impact list:".bold(), manifest.display());
            }
        }
        RunStatus::SkippedEmpty => {
            println!("{}", "No impacts detected in the audio.".yellow());
        }
        RunStatus::Failed(reason) => {
            println!("{} {}", "Failed:".red().bold(), reason);
        }
        RunStatus::Pending | RunStatus::Running => {
            println!("{} {}", "Status:".bold(), summary.status);
        }
    }
}
