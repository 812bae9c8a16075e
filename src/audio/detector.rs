//! Acoustic impact detection.
//!
//! Two passes over a [`SampleStream`]: the first finds the global peak, the
//! second accepts local maxima above a fraction of that peak, separated by a
//! refractory gap. The threshold never adapts while scanning.

use crate::audio::stream::SampleStream;
use crate::defaults;
use serde::Serialize;

/// A detected acoustic peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactEvent {
    /// Position of the peak in seconds from the start of the track.
    pub timestamp_secs: f64,
    /// Frame index of the peak.
    pub sample_index: usize,
}

/// Tunables for [`ImpactDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Fraction of the global peak a sample must exceed.
    pub threshold_ratio: f64,
    /// Minimum gap between accepted impacts, in milliseconds.
    pub refractory_ms: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: defaults::THRESHOLD_RATIO,
            refractory_ms: defaults::REFRACTORY_MS,
        }
    }
}

impl DetectorConfig {
    /// Refractory period expressed in frames, rounded down.
    pub fn min_distance_samples(&self, sample_rate: u32) -> usize {
        (u64::from(sample_rate) * u64::from(self.refractory_ms) / 1000) as usize
    }
}

/// Finds impact events in decoded audio.
#[derive(Debug, Clone, Default)]
pub struct ImpactDetector {
    config: DetectorConfig,
}

impl ImpactDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Scan the whole stream and return impacts in ascending order.
    ///
    /// Silence, streams shorter than three frames and streams with no
    /// qualifying peak all yield an empty list.
    pub fn detect(&self, stream: &SampleStream) -> Vec<ImpactEvent> {
        let frames = stream.frame_count();
        if frames < 3 {
            return Vec::new();
        }

        let magnitude = |i: usize| i32::from(stream.amplitude(i)).abs();

        let peak = (0..frames).map(magnitude).max().unwrap_or(0);
        if peak == 0 {
            return Vec::new();
        }

        let threshold = self.config.threshold_ratio * f64::from(peak);
        let sample_rate = stream.sample_rate();
        let min_distance = self.config.min_distance_samples(sample_rate) as i64;
        let mut last_accepted = -min_distance;

        let mut events = Vec::new();
        let mut prev = magnitude(0);
        let mut current = magnitude(1);
        for i in 1..frames - 1 {
            let next = magnitude(i + 1);
            if f64::from(current) > threshold
                && current > prev
                && current >= next
                && i as i64 - last_accepted > min_distance
            {
                events.push(ImpactEvent {
                    timestamp_secs: i as f64 / f64::from(sample_rate),
                    sample_index: i,
                });
                last_accepted = i as i64;
            }
            prev = current;
            current = next;
        }

        events
    }
}
