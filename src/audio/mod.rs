//! Decoded audio and the impact detector that runs over it.

pub mod detector;
pub mod stream;

pub use detector::{DetectorConfig, ImpactDetector, ImpactEvent};
pub use stream::{AudioFormat, SampleStream};
