use crate::defaults;
use crate::error::{HawkeyeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub decoder: DecoderConfig,
    pub detection: DetectionConfig,
    pub capture: CaptureConfig,
    pub video: VideoConfig,
}

/// External decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecoderConfig {
    pub path: String,
    pub extract_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub capture_timeout_secs: u64,
}

/// Impact detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    pub threshold_ratio: f64,
    pub refractory_ms: u32,
}

/// Frame capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub acoustic_offset_secs: f64,
    pub screenshot_dir: PathBuf,
    pub frames_dir: PathBuf,
    pub output_policy: OutputPolicy,
}

/// Source video configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub default_path: PathBuf,
}

/// What happens to the output directories at the start of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputPolicy {
    /// Delete and recreate both directories; every run replaces the last one.
    #[default]
    Wipe,
    /// Write into a fresh `run-<millis>` subdirectory and delete nothing.
    PerRun,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            path: defaults::DECODER.to_string(),
            extract_timeout_secs: defaults::EXTRACT_TIMEOUT_SECS,
            probe_timeout_secs: defaults::PROBE_TIMEOUT_SECS,
            capture_timeout_secs: defaults::CAPTURE_TIMEOUT_SECS,
        }
    }
}

impl DecoderConfig {
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: defaults::THRESHOLD_RATIO,
            refractory_ms: defaults::REFRACTORY_MS,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            acoustic_offset_secs: defaults::ACOUSTIC_OFFSET_SECS,
            screenshot_dir: PathBuf::from(defaults::SCREENSHOT_DIR),
            frames_dir: PathBuf::from(defaults::FRAMES_DIR),
            output_policy: OutputPolicy::Wipe,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            default_path: PathBuf::from(defaults::VIDEO_PATH),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(HawkeyeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(HawkeyeError::ConfigParse {
                message: format!("{}: {}", path.display(), e),
            }),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - HAWKEYE_DECODER → decoder.path
    /// - HAWKEYE_VIDEO → video.default_path
    /// - HAWKEYE_ACOUSTIC_OFFSET → capture.acoustic_offset_secs (ignored if not a number)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(decoder) = std::env::var("HAWKEYE_DECODER")
            && !decoder.is_empty()
        {
            self.decoder.path = decoder;
        }

        if let Ok(video) = std::env::var("HAWKEYE_VIDEO")
            && !video.is_empty()
        {
            self.video.default_path = PathBuf::from(video);
        }

        if let Ok(offset) = std::env::var("HAWKEYE_ACOUSTIC_OFFSET")
            && let Ok(secs) = offset.trim().parse::<f64>()
        {
            self.capture.acoustic_offset_secs = secs;
        }

        self
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| HawkeyeError::ConfigInvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.decoder.path.trim().is_empty() {
            return Err(invalid("decoder.path", "must not be empty"));
        }
        for (key, secs) in [
            ("decoder.extract_timeout_secs", self.decoder.extract_timeout_secs),
            ("decoder.probe_timeout_secs", self.decoder.probe_timeout_secs),
            ("decoder.capture_timeout_secs", self.decoder.capture_timeout_secs),
        ] {
            if secs == 0 {
                return Err(invalid(key, "must be at least 1 second"));
            }
        }
        let ratio = self.detection.threshold_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(invalid("detection.threshold_ratio", "must be in (0, 1]"));
        }
        let offset = self.capture.acoustic_offset_secs;
        if !offset.is_finite() || offset < 0.0 {
            return Err(invalid(
                "capture.acoustic_offset_secs",
                "must be a non-negative number of seconds",
            ));
        }
        if self.capture.screenshot_dir == self.capture.frames_dir {
            return Err(invalid(
                "capture.frames_dir",
                "must differ from capture.screenshot_dir",
            ));
        }

        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/hawkeye/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hawkeye").join("config.toml"))
    }
}
