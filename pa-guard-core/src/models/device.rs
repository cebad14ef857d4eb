use serde::{Deserialize, Serialize};

/// Index of an audio device as reported by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceIndex(pub i32);

impl DeviceIndex {
    /// Returned by the library when no (default) device is available.
    pub const NO_DEVICE: Self = Self(-1);
}

/// Static properties of one audio device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub max_input_channels: i32,
    pub max_output_channels: i32,
    pub default_low_input_latency: f64,
    pub default_low_output_latency: f64,
    pub default_high_input_latency: f64,
    pub default_high_output_latency: f64,
    pub default_sample_rate: f64,
}

/// Properties of an open stream, which may differ from what was requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    /// Input latency in seconds; 0 for output-only streams.
    pub input_latency: f64,
    /// Output latency in seconds; 0 for input-only streams.
    pub output_latency: f64,
    pub sample_rate: f64,
}
