//! End-to-end pipeline runs against a scripted decoder.
//!
//! The mock decoder writes a synthesized stereo WAV with two strikes at
//! 1.000 s and 1.250 s when asked to extract audio, and a stub image when
//! asked to capture a frame.

use hawkeye::media::{CommandOutput, MockCommandExecutor};
use hawkeye::pipeline::{CollectorSink, OutputDirs};
use hawkeye::{OutputPolicy, Pipeline, PipelineConfig, ProgressEvent, RunStatus, Stage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const RATE: u32 = 44_100;
const STRIKES: [usize; 2] = [44_100, 55_125];

fn write_rally(path: &Path) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..(RATE as usize * 2) {
        // Low crowd noise with two loud strikes on the left channel
        let noise = ((i % 50) as i16) - 25;
        let left = if STRIKES.contains(&i) { 22_000 } else { noise };
        writer.write_sample(left).unwrap();
        writer.write_sample(noise).unwrap();
    }
    writer.finalize().unwrap();
}

fn scripted_decoder() -> MockCommandExecutor {
    MockCommandExecutor::new().with_effect(|_, args| {
        let Some(out) = args.last() else { return };
        if args.iter().any(|a| a == "-vn") {
            write_rally(Path::new(out));
        } else if args.iter().any(|a| a == "-vframes") {
            fs::write(out, b"\x89PNG").unwrap();
        }
    })
}

fn config(root: &Path, policy: OutputPolicy) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.outputs = OutputDirs {
        screenshot_dir: root.join("impact_screenshots"),
        frames_dir: root.join("frames"),
        policy,
    };
    config.quiet = true;
    config
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn two_strikes_produce_two_compensated_screenshots() {
    let root = TempDir::new().unwrap();
    let mock = Arc::new(scripted_decoder());
    let sink = CollectorSink::new();

    let summary = Pipeline::new(config(root.path(), OutputPolicy::Wipe))
        .with_executor(mock.clone())
        .run(Path::new("test_17.mp4"), Arc::new(sink.clone()));

    assert_eq!(summary.status, RunStatus::Succeeded);
    let heard: Vec<f64> = summary.impacts.iter().map(|e| e.timestamp_secs).collect();
    assert_eq!(heard, vec![1.0, 1.25]);

    let calls = mock.calls();
    let extract = &calls[0].1;
    assert_eq!(
        extract[..9],
        ["-i", "test_17.mp4", "-vn", "-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2"]
    );
    assert_eq!(calls[1].1, vec!["-i".to_string(), "test_17.mp4".to_string()]);

    let seeks: Vec<&str> = calls
        .iter()
        .filter_map(|(_, args)| {
            let at = args.iter().position(|a| a == "-ss")?;
            args.get(at + 1).map(String::as_str)
        })
        .collect();
    assert_eq!(seeks, vec!["0.910", "1.160"]);

    let shots = root.path().join("impact_screenshots");
    assert_eq!(
        listing(&shots),
        vec!["impact_1.000.png", "impact_1.250.png", "impacts.json"]
    );
    assert_eq!(summary.manifest, Some(shots.join("impacts.json")));
    assert_eq!(summary.screenshot_dir, Some(shots));

    let events: Vec<ProgressEvent> = sink.events();
    let stages: Vec<Stage> = events.iter().map(|e| e.stage).collect();
    assert!(stages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(
        events.last().unwrap().message,
        "Processing complete! 2 impacts detected and captured."
    );
}

#[test]
fn repeated_runs_leave_identical_output() {
    let root = TempDir::new().unwrap();
    let shots = root.path().join("impact_screenshots");

    let mut listings = Vec::new();
    for _ in 0..2 {
        let summary = Pipeline::new(config(root.path(), OutputPolicy::Wipe))
            .with_executor(Arc::new(scripted_decoder()))
            .run(Path::new("test_17.mp4"), Arc::new(CollectorSink::new()));
        assert_eq!(summary.status, RunStatus::Succeeded);
        listings.push(listing(&shots));
    }

    assert_eq!(listings[0], listings[1]);
    assert!(listing(&root.path().join("frames")).is_empty());
}

#[test]
fn per_run_policy_keeps_earlier_runs() {
    let root = TempDir::new().unwrap();
    let mut dirs: Vec<PathBuf> = Vec::new();

    for _ in 0..2 {
        let summary = Pipeline::new(config(root.path(), OutputPolicy::PerRun))
            .with_executor(Arc::new(scripted_decoder()))
            .run(Path::new("test_17.mp4"), Arc::new(CollectorSink::new()));
        dirs.push(summary.screenshot_dir.unwrap());
        // Run directories are named by millisecond
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert_ne!(dirs[0], dirs[1]);
    for dir in &dirs {
        assert_eq!(
            listing(dir),
            vec!["impact_1.000.png", "impact_1.250.png", "impacts.json"]
        );
    }
}

#[test]
fn extraction_failure_ends_the_run_before_any_output() {
    let root = TempDir::new().unwrap();
    let mock = Arc::new(
        MockCommandExecutor::new()
            .with_response(Ok(CommandOutput::failure(1, vec!["No such file".to_string()]))),
    );
    let sink = CollectorSink::new();

    let summary = Pipeline::new(config(root.path(), OutputPolicy::Wipe))
        .with_executor(mock.clone())
        .run(Path::new("missing.mp4"), Arc::new(sink.clone()));

    assert!(matches!(summary.status, RunStatus::Failed(_)));
    assert_eq!(mock.calls().len(), 1);
    assert!(!root.path().join("impact_screenshots").exists());

    let last = sink.events().pop().unwrap();
    assert_eq!(last.percent, 0);
    assert_eq!(last.message, "Failed to extract audio from video.");
    assert_eq!(summary.manifest, None);
}

#[test]
fn manifest_indexes_screenshots_for_later_analysis() {
    let root = TempDir::new().unwrap();
    let summary = Pipeline::new(config(root.path(), OutputPolicy::Wipe))
        .with_executor(Arc::new(scripted_decoder()))
        .run(Path::new("test_17.mp4"), Arc::new(CollectorSink::new()));

    let manifest = summary.manifest.unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    let entries = value["impacts"].as_array().unwrap();

    assert_eq!(value["video"], "test_17.mp4");
    assert_eq!(entries.len(), 2);
    for entry in entries {
        let image = entry["image"].as_str().unwrap();
        assert!(manifest.with_file_name(image).is_file());
    }
    assert_eq!(entries[1]["impact"], 2);
    assert_eq!(entries[1]["image"], "impact_1.250.png");
}

#[test]
fn background_run_streams_progress_to_the_end() {
    let root = TempDir::new().unwrap();
    let handle = Pipeline::new(config(root.path(), OutputPolicy::Wipe))
        .with_executor(Arc::new(scripted_decoder()))
        .spawn(PathBuf::from("test_17.mp4"))
        .unwrap();

    let percents: Vec<u8> = handle.progress().iter().map(|e| e.percent).collect();
    let summary = handle.wait();

    assert_eq!(percents, vec![10, 40, 60, 80, 100]);
    assert_eq!(summary.captured.len(), 2);
    assert!(summary.failed_captures.is_empty());
}
